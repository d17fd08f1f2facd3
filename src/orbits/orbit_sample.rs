//! # Orbit sample estimation
//!
//! Turn one [`OrbitRecord`] into a measured declination at a geodetic position:
//!
//! 1. altitude above the spherical Earth: `radius / 1000 - earth_radius_km`,
//! 2. geocentric spherical position → ECEF ([`geocentric_to_ecef`]),
//! 3. ECEF → WGS84 geodetic through the configured [`GeodeticInversion`],
//! 4. epoch as a decimal year from the record timestamp,
//! 5. declination `atan(B_E / B_N)`.
//!
//! A single record carries no dispersion information, so the uncertainty is `None`.
use hifitime::Epoch;

use crate::{
    constants::{DecimalYear, Degree, Kilometer, METERS_PER_KILOMETER},
    conversion::{geocentric_to_ecef, normalize_longitude, GeodeticInversion, GeodeticPosition},
    dataset::{MeasuredUnit, SourceType},
    declination::declination_from_components,
    magdecl_errors::MagDeclError,
    model_client::ModelQuery,
    time::{format_date, format_hms, EpochMode},
};

use super::orbit_record::OrbitRecord;

/// Measured declination of one satellite record.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitSample {
    pub timestamp: Epoch,
    pub epoch: DecimalYear,
    pub position: GeodeticPosition,
    pub declination: Degree,
}

/// `YYYY-MM-DDTHH:MM:SS` identifier of a satellite sample.
pub fn sample_id(timestamp: &Epoch) -> String {
    format!("{}T{}", format_date(timestamp), format_hms(timestamp))
}

impl OrbitSample {
    pub fn source_id(&self) -> String {
        sample_id(&self.timestamp)
    }

    /// Attach the pass sequence number and build the query sent to the model service.
    pub fn into_measured(self, sequence: usize) -> MeasuredUnit {
        let query = ModelQuery {
            latitude: self.position.latitude,
            longitude: normalize_longitude(self.position.longitude),
            altitude: self.position.altitude,
            year: self.epoch,
        };
        MeasuredUnit {
            sequence,
            source_id: self.source_id(),
            source_type: SourceType::Satellite,
            label: format_hms(&self.timestamp),
            epoch: self.epoch,
            latitude: self.position.latitude,
            longitude: self.position.longitude,
            altitude_km: self.position.altitude,
            declination_measured: self.declination,
            uncertainty: None,
            query,
            epoch_flagged: false,
        }
    }
}

/// Estimate the declination of one orbit record.
///
/// Arguments
/// ---------
/// * `record`: the raw record
/// * `earth_radius`: spherical Earth radius (km) the altitude is measured from
/// * `inversion`: ECEF → geodetic algorithm
/// * `epoch_mode`: decimal-year convention
///
/// Return
/// ------
/// * the sample, or [`MagDeclError::NumericDomain`] when the position or the
///   horizontal field is not usable
pub fn estimate_orbit_sample(
    record: &OrbitRecord,
    earth_radius: Kilometer,
    inversion: &dyn GeodeticInversion,
    epoch_mode: EpochMode,
) -> Result<OrbitSample, MagDeclError> {
    let declination = declination_from_components(record.b_north(), record.b_east())?;

    let altitude = record.radius / METERS_PER_KILOMETER - earth_radius;
    let ecef = geocentric_to_ecef(
        record.latitude_geocentric,
        record.longitude_geocentric,
        altitude,
        earth_radius,
    );
    if !ecef.iter().all(|c| c.is_finite()) {
        return Err(MagDeclError::NumericDomain {
            x: record.latitude_geocentric,
            y: record.longitude_geocentric,
        });
    }

    Ok(OrbitSample {
        timestamp: record.timestamp,
        epoch: epoch_mode.decimal_year(&record.timestamp),
        position: inversion.ecef_to_geodetic(&ecef),
        declination,
    })
}

#[cfg(test)]
mod orbit_sample_test {
    use super::*;
    use crate::{conversion::InversionMethod, time::parse_utc_timestamp};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn record(latitude: f64, b_n: f64, b_e: f64) -> OrbitRecord {
        OrbitRecord {
            timestamp: parse_utc_timestamp("2021-07-02T12:00:00Z").unwrap(),
            latitude_geocentric: latitude,
            longitude_geocentric: 200.0,
            radius: 6_821_000.0,
            b_nec: Vector3::new(b_n, b_e, 40_000.0),
        }
    }

    #[test]
    fn test_equatorial_sample() {
        let sample = estimate_orbit_sample(
            &record(0.0, 1.0, 1.0),
            6371.0,
            &InversionMethod::Bowring,
            EpochMode::Exact,
        )
        .unwrap();
        assert_relative_eq!(sample.declination, 45.0, epsilon = 1e-12);
        assert_relative_eq!(sample.epoch, 2021.5, epsilon = 1e-9);
        assert_relative_eq!(sample.position.latitude, 0.0, epsilon = 1e-9);
        // 6821 km from the center, 6378.137 km equatorial radius
        assert_relative_eq!(sample.position.altitude, 442.863, epsilon = 1e-6);
        assert_relative_eq!(sample.position.longitude, -160.0, epsilon = 1e-9);

        let unit = sample.into_measured(3);
        assert_eq!(unit.label, "12:00:00");
        assert_eq!(unit.source_id, "2021-07-02T12:00:00");
        assert_eq!(unit.uncertainty, None);
        assert_relative_eq!(unit.query.longitude, -160.0, epsilon = 1e-9);
    }

    #[test]
    fn test_singular_field() {
        let err = estimate_orbit_sample(
            &record(10.0, 0.0, 0.0),
            6371.0,
            &InversionMethod::Heikkinen,
            EpochMode::Exact,
        );
        assert_eq!(err, Err(MagDeclError::NumericDomain { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn test_non_finite_position() {
        let err = estimate_orbit_sample(
            &record(f64::NAN, 1.0, 0.0),
            6371.0,
            &InversionMethod::Bowring,
            EpochMode::Exact,
        );
        assert!(matches!(err, Err(MagDeclError::NumericDomain { .. })));
    }
}
