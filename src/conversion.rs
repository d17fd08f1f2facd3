//! # Coordinate normalization
//!
//! Values forwarded to the model service are normalized here:
//!
//! * longitudes are mapped from the `[0, 360)` convention of IAGA-2002 headers to
//!   `(-180, 180]` ([`normalize_longitude`]),
//! * altitudes are always expressed in **kilometers** ([`elevation_to_km`]),
//! * satellite positions given as geocentric spherical coordinates are converted to
//!   ECEF ([`geocentric_to_ecef`]) and then inverted to WGS84 geodetic coordinates
//!   through a pluggable [`GeodeticInversion`].
//!
//! Coordinates kept for rendering are **not** passed through these helpers; they keep
//! the native convention of their source.
use std::fmt::Debug;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    Degree, Kilometer, Meter, METERS_PER_KILOMETER, WGS84_E2, WGS84_SEMI_MAJOR_AXIS_KM,
    WGS84_SEMI_MINOR_AXIS_KM,
};

/// Map a longitude from the `[0, 360)` convention to `(-180, 180]`.
///
/// Values already in range are returned unchanged.
pub fn normalize_longitude(longitude: Degree) -> Degree {
    if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}

/// Convert an optional elevation in meters to kilometers, a missing elevation counting
/// as sea level.
pub fn elevation_to_km(elevation: Option<Meter>) -> Kilometer {
    elevation.unwrap_or(0.0) / METERS_PER_KILOMETER
}

/// Geodetic position on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    /// geodetic latitude in degrees
    pub latitude: Degree,
    /// longitude in degrees, `(-180, 180]`
    pub longitude: Degree,
    /// height above the ellipsoid in kilometers
    pub altitude: Kilometer,
}

/// Convert a geocentric spherical position to ECEF cartesian coordinates.
///
/// The radius of the position is `earth_radius + altitude`, i.e. the altitude is
/// measured above a spherical Earth.
///
/// Arguments
/// ---------
/// * `latitude`: geocentric latitude in degrees
/// * `longitude`: longitude in degrees
/// * `altitude`: altitude above the spherical Earth in kilometers
/// * `earth_radius`: radius of the spherical Earth in kilometers
///
/// Return
/// ------
/// * the ECEF position in kilometers
pub fn geocentric_to_ecef(
    latitude: Degree,
    longitude: Degree,
    altitude: Kilometer,
    earth_radius: Kilometer,
) -> Vector3<f64> {
    let r = earth_radius + altitude;
    let (lat, lon) = (latitude.to_radians(), longitude.to_radians());
    Vector3::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

/// Convert a WGS84 geodetic position to ECEF cartesian coordinates (kilometers).
pub fn geodetic_to_ecef(position: &GeodeticPosition) -> Vector3<f64> {
    let (lat, lon) = (
        position.latitude.to_radians(),
        position.longitude.to_radians(),
    );
    let n = prime_vertical_radius(lat);
    Vector3::new(
        (n + position.altitude) * lat.cos() * lon.cos(),
        (n + position.altitude) * lat.cos() * lon.sin(),
        (n * (1.0 - WGS84_E2) + position.altitude) * lat.sin(),
    )
}

/// Radius of curvature in the prime vertical at a geodetic latitude (radians).
fn prime_vertical_radius(latitude: f64) -> Kilometer {
    WGS84_SEMI_MAJOR_AXIS_KM / (1.0 - WGS84_E2 * latitude.sin().powi(2)).sqrt()
}

/// ECEF → geodetic inversion.
///
/// Any correct inversion on the WGS84 ellipsoid is acceptable; the crate ships an
/// iterative one ([`InversionMethod::Bowring`]) and a closed-form one
/// ([`InversionMethod::Heikkinen`]).
pub trait GeodeticInversion: Debug + Send + Sync {
    /// Invert an ECEF position given in kilometers.
    fn ecef_to_geodetic(&self, ecef: &Vector3<f64>) -> GeodeticPosition;
}

/// Inversion algorithms available out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InversionMethod {
    /// Fixed-point iteration on the latitude, converges everywhere including the poles.
    #[default]
    Bowring,
    /// Closed-form solution (Heikkinen 1982, as published by Zhu 1993).
    Heikkinen,
}

impl GeodeticInversion for InversionMethod {
    fn ecef_to_geodetic(&self, ecef: &Vector3<f64>) -> GeodeticPosition {
        match self {
            InversionMethod::Bowring => bowring_inversion(ecef),
            InversionMethod::Heikkinen => heikkinen_inversion(ecef),
        }
    }
}

const BOWRING_MAX_ITER: usize = 30;
const BOWRING_TOLERANCE: f64 = 1e-14;

fn bowring_inversion(ecef: &Vector3<f64>) -> GeodeticPosition {
    let (x, y, z) = (ecef.x, ecef.y, ecef.z);
    let p = x.hypot(y);
    let longitude = y.atan2(x);

    let mut latitude = z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..BOWRING_MAX_ITER {
        let n = prime_vertical_radius(latitude);
        let next = (z + WGS84_E2 * n * latitude.sin()).atan2(p);
        let delta = (next - latitude).abs();
        latitude = next;
        if delta < BOWRING_TOLERANCE {
            break;
        }
    }

    // valid at every latitude, including p = 0
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let altitude = p * cos_lat + z * sin_lat
        - WGS84_SEMI_MAJOR_AXIS_KM * (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    GeodeticPosition {
        latitude: latitude.to_degrees(),
        longitude: longitude.to_degrees(),
        altitude,
    }
}

fn heikkinen_inversion(ecef: &Vector3<f64>) -> GeodeticPosition {
    let a = WGS84_SEMI_MAJOR_AXIS_KM;
    let b = WGS84_SEMI_MINOR_AXIS_KM;
    let e2 = WGS84_E2;
    let ep2 = (a * a - b * b) / (b * b);

    let (x, y, z) = (ecef.x, ecef.y, ecef.z);
    let p = x.hypot(y);

    let f = 54.0 * b * b * z * z;
    let g = p * p + (1.0 - e2) * z * z - e2 * (a * a - b * b);
    let c = e2 * e2 * f * p * p / (g * g * g);
    let s = (1.0 + c + (c * c + 2.0 * c).sqrt()).cbrt();
    let k = s + 1.0 / s + 1.0;
    let big_p = f / (3.0 * k * k * g * g);
    let q = (1.0 + 2.0 * e2 * e2 * big_p).sqrt();
    let r0 = -(big_p * e2 * p) / (1.0 + q)
        + (0.5 * a * a * (1.0 + 1.0 / q)
            - big_p * (1.0 - e2) * z * z / (q * (1.0 + q))
            - 0.5 * big_p * p * p)
            .max(0.0)
            .sqrt();
    let u = ((p - e2 * r0).powi(2) + z * z).sqrt();
    let v = ((p - e2 * r0).powi(2) + (1.0 - e2) * z * z).sqrt();
    let z0 = b * b * z / (a * v);

    GeodeticPosition {
        latitude: (z + ep2 * z0).atan2(p).to_degrees(),
        longitude: y.atan2(x).to_degrees(),
        altitude: u * (1.0 - b * b / (a * v)),
    }
}
