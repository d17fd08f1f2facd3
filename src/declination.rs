//! # Declination estimation
//!
//! Shared numerics of the two data sources:
//!
//! * [`declination_from_components`] derives a declination from the two horizontal
//!   field components (`X`/`Y` for an observatory, `B_N`/`B_E` for the satellite),
//! * [`DeclinationStats`] aggregates the per-row declinations of one unit into a mean
//!   and a standard error.
//!
//! ## Singular inputs
//!
//! The declination is `atan(Y / X)`, which is undefined for `X = 0`. The branch is
//! resolved as follows:
//!
//! | X     | Y     | result                                     |
//! |-------|-------|--------------------------------------------|
//! | `0`   | `> 0` | `+90°`                                     |
//! | `0`   | `< 0` | `-90°`                                     |
//! | `0`   | `0`   | [`MagDeclError::NumericDomain`]            |
//! | any non-finite input | | [`MagDeclError::NumericDomain`]     |
//!
//! `atan` (not `atan2`) keeps results in `[-90°, 90°]`, the range observatory
//! declinations are reported in.
use serde::{Deserialize, Serialize};

use crate::{constants::Degree, magdecl_errors::MagDeclError};

/// Declination (degrees) from the northward and eastward horizontal components.
///
/// Arguments
/// ---------
/// * `x`: northward component (X, or B_N)
/// * `y`: eastward component (Y, or B_E)
///
/// Return
/// ------
/// * the declination in degrees, or [`MagDeclError::NumericDomain`] when it is undefined
pub fn declination_from_components(x: f64, y: f64) -> Result<Degree, MagDeclError> {
    if !x.is_finite() || !y.is_finite() {
        return Err(MagDeclError::NumericDomain { x, y });
    }
    if x == 0.0 {
        return if y > 0.0 {
            Ok(90.0)
        } else if y < 0.0 {
            Ok(-90.0)
        } else {
            Err(MagDeclError::NumericDomain { x, y })
        };
    }
    Ok((y / x).atan().to_degrees())
}

/// Summary of the valid declinations of one unit.
///
/// The standard error is the population standard deviation divided by `sqrt(n - 1)`.
/// It is undefined for a single sample, in which case `std_error` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclinationStats {
    pub count: usize,
    pub mean: Degree,
    pub std_error: Option<Degree>,
}

impl DeclinationStats {
    /// Aggregate a set of declinations.
    ///
    /// Return
    /// ------
    /// * `None` if `samples` is empty
    pub fn from_samples(samples: &[Degree]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;

        let std_error = (samples.len() > 1).then(|| {
            let variance = samples.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
            variance.sqrt() / (n - 1.0).sqrt()
        });

        Some(DeclinationStats {
            count: samples.len(),
            mean,
            std_error,
        })
    }
}
