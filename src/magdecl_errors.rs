use std::time::Duration;

use thiserror::Error;

use crate::constants::DecimalYear;
use crate::observatories::iaga_reader::ParseIagaError;
use crate::orbits::orbit_reader::ParseOrbitError;

/// Crate-wide error type.
///
/// Variants fall in two groups:
///
/// * **Unit-level** failures (`ParseIaga`, `ParseOrbit`, `NoValidRows`,
///   `EpochConsistency`, `NumericDomain`, `ModelService`, `ModelStatus`,
///   `ModelTimeout`, `ModelTaskFailed`, `Cancelled`) are isolated to one station-day
///   or one orbit sample and end up in the audit list of a [`RunReport`](crate::pipeline::RunReport).
/// * **Run-level** failures (`EmptyInput`, `IoError`, `InvalidConfig`) abort the run.
#[derive(Error, Debug)]
pub enum MagDeclError {
    #[error("Error during the IAGA-2002 file parsing: {0}")]
    ParseIaga(#[from] ParseIagaError),

    #[error("Error during the orbit record parsing: {0}")]
    ParseOrbit(#[from] ParseOrbitError),

    #[error("No valid rows for unit {0}")]
    NoValidRows(String),

    #[error("Epoch mismatch: batch epoch is {expected}, unit resolved to {found}")]
    EpochConsistency {
        expected: DecimalYear,
        found: DecimalYear,
    },

    #[error("Declination undefined for horizontal components X={x}, Y={y}")]
    NumericDomain { x: f64, y: f64 },

    #[error("Model service request failed: {0}")]
    ModelService(String),

    #[error("Model service answered HTTP {status}: {body}")]
    ModelStatus { status: u16, body: String },

    #[error("Model service did not answer within {0:?}")]
    ModelTimeout(Duration),

    #[error("Model query task failed: {0}")]
    ModelTaskFailed(String),

    #[error("Unit not processed: run cancelled")]
    Cancelled,

    #[error("Empty input set: {0}")]
    EmptyInput(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid run configuration: {0}")]
    InvalidConfig(String),
}

impl MagDeclError {
    /// `true` for the failures that abort a whole run instead of a single unit.
    pub fn is_run_level(&self) -> bool {
        matches!(
            self,
            MagDeclError::EmptyInput(_) | MagDeclError::IoError(_) | MagDeclError::InvalidConfig(_)
        )
    }
}

impl PartialEq for MagDeclError {
    fn eq(&self, other: &Self) -> bool {
        use MagDeclError::*;
        match (self, other) {
            (ParseIaga(a), ParseIaga(b)) => a == b,
            (ParseOrbit(a), ParseOrbit(b)) => a == b,
            (NoValidRows(a), NoValidRows(b)) => a == b,
            (
                EpochConsistency {
                    expected: e1,
                    found: f1,
                },
                EpochConsistency {
                    expected: e2,
                    found: f2,
                },
            ) => e1 == e2 && f1 == f2,
            (NumericDomain { x: x1, y: y1 }, NumericDomain { x: x2, y: y2 }) => {
                x1 == x2 && y1 == y2
            }
            (ModelService(a), ModelService(b)) => a == b,
            (
                ModelStatus {
                    status: s1,
                    body: b1,
                },
                ModelStatus {
                    status: s2,
                    body: b2,
                },
            ) => s1 == s2 && b1 == b2,
            (ModelTimeout(a), ModelTimeout(b)) => a == b,
            (ModelTaskFailed(a), ModelTaskFailed(b)) => a == b,
            (EmptyInput(a), EmptyInput(b)) => a == b,
            (InvalidConfig(a), InvalidConfig(b)) => a == b,

            // io errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,

            (Cancelled, Cancelled) => true,

            _ => false,
        }
    }
}
