//! # Constants and type definitions for magdecl
//!
//! This module centralizes the **geodetic constants**, **format constants**, and
//! **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - WGS84 ellipsoid parameters used by the geocentric → geodetic inversion
//! - The spherical Earth radius assumed by the satellite processing chain
//! - IAGA-2002 format constants (sentinel value, header key width)
//! - Unit aliases shared by every module

// -------------------------------------------------------------------------------------------------
// Geodetic constants
// -------------------------------------------------------------------------------------------------

/// WGS84 semi-major axis in kilometers
pub const WGS84_SEMI_MAJOR_AXIS_KM: f64 = 6_378.137;

/// WGS84 flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// WGS84 semi-minor axis in kilometers
pub const WGS84_SEMI_MINOR_AXIS_KM: f64 = WGS84_SEMI_MAJOR_AXIS_KM * (1.0 - WGS84_FLATTENING);

/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);

/// Mean Earth radius (km) assumed when the orbit radius is turned into an altitude.
pub const DEFAULT_EARTH_RADIUS_KM: f64 = 6_371.0;

/// Meters → kilometers
pub const METERS_PER_KILOMETER: f64 = 1_000.0;

// -------------------------------------------------------------------------------------------------
// IAGA-2002 format
// -------------------------------------------------------------------------------------------------

/// Placeholder written by observatories for a missing or corrupted field.
pub const IAGA_SENTINEL: f64 = 99_999.00;

/// Width of the fixed key field of an IAGA-2002 header line.
pub const IAGA_HEADER_KEY_WIDTH: usize = 24;

/// Token opening the data table of an IAGA-2002 file.
pub const IAGA_TABLE_TOKEN: &str = "DATE";

/// Stray column separator found at the end of IAGA-2002 header lines.
pub const IAGA_SEPARATOR: &str = "|";

/// Extension of the minute-data files picked up by a directory scan.
pub const IAGA_MINUTE_EXTENSION: &str = "min";

/// Days per year used by the observatory day-of-year epoch approximation.
pub const DAYS_PER_YEAR_APPROX: f64 = 365.0;

// -------------------------------------------------------------------------------------------------
// Run defaults
// -------------------------------------------------------------------------------------------------

/// One satellite record out of `DEFAULT_ORBIT_STRIDE` is queried.
pub const DEFAULT_ORBIT_STRIDE: usize = 100;

/// Model queries allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;

/// Per-query timeout of the model service, milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Model service host queried by default.
pub const DEFAULT_MODEL_HOST: &str = "https://geomag.amentum.io";

/// Magnetic field endpoint of the model service.
pub const DEFAULT_MODEL_PATH: &str = "/wmm/magnetic_field";

/// Header carrying the model service credential.
pub const API_KEY_HEADER: &str = "API-Key";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Distance in meters
pub type Meter = f64;
/// Magnetic field component in nanotesla
pub type NanoTesla = f64;
/// Epoch expressed as a fractional calendar year (e.g. `2021.2767`)
pub type DecimalYear = f64;
