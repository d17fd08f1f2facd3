//! # Orbit record sources
//!
//! A satellite pass is exposed as named, equally long arrays (`Timestamp`, `Latitude`,
//! `Longitude`, `Radius`, `B_NEC`) through the [`OrbitSource`] trait.
//!
//! The crate ships [`OrbitArrays`], an owned in-memory implementation, which can be
//! built either from vectors ([`OrbitArrays::new`]) or from a CSV export
//! ([`OrbitArrays::from_csv_path`], [`OrbitArrays::from_csv_reader`]) with header
//!
//! ```text
//! Timestamp,Latitude,Longitude,Radius,B_N,B_E,B_C
//! 2021-04-11T06:30:00Z,45.1,10.2,6828137.0,20123.4,1832.1,41250.7
//! ```
use std::io::Read;

use camino::Utf8Path;
use hifitime::Epoch;
use nalgebra::Vector3;
use thiserror::Error;

use crate::{
    constants::{Degree, Meter, NanoTesla},
    time::parse_utc_timestamp,
};

use super::orbit_record::OrbitRecord;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseOrbitError {
    #[error("Array {array} has {found} entries, expected {expected}")]
    MismatchedLengths {
        array: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Row {row}: invalid timestamp {value:?}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Unable to read the orbit file: {0}")]
    Unreadable(String),
}

impl From<csv::Error> for ParseOrbitError {
    fn from(err: csv::Error) -> Self {
        ParseOrbitError::Csv(err.to_string())
    }
}

/// Named-array view of a satellite pass.
///
/// Every array has [`OrbitSource::len`] entries; index `i` of each array describes
/// the same record.
pub trait OrbitSource {
    fn timestamps(&self) -> &[Epoch];
    fn latitudes(&self) -> &[Degree];
    fn longitudes(&self) -> &[Degree];
    fn radii(&self) -> &[Meter];
    fn b_nec(&self) -> &[Vector3<NanoTesla>];

    fn len(&self) -> usize {
        self.timestamps().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Gather the record at `index`, `None` when out of range.
    fn record(&self, index: usize) -> Option<OrbitRecord> {
        Some(OrbitRecord {
            timestamp: *self.timestamps().get(index)?,
            latitude_geocentric: *self.latitudes().get(index)?,
            longitude_geocentric: *self.longitudes().get(index)?,
            radius: *self.radii().get(index)?,
            b_nec: *self.b_nec().get(index)?,
        })
    }
}

/// Owned in-memory satellite pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrbitArrays {
    timestamps: Vec<Epoch>,
    latitudes: Vec<Degree>,
    longitudes: Vec<Degree>,
    radii: Vec<Meter>,
    b_nec: Vec<Vector3<NanoTesla>>,
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct CsvOrbitRow {
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "Latitude")]
    latitude: f64,
    #[serde(rename = "Longitude")]
    longitude: f64,
    #[serde(rename = "Radius")]
    radius: f64,
    #[serde(rename = "B_N")]
    b_n: f64,
    #[serde(rename = "B_E")]
    b_e: f64,
    #[serde(rename = "B_C")]
    b_c: f64,
}

impl OrbitArrays {
    /// Build a pass from its named arrays.
    ///
    /// Return
    /// ------
    /// * [`ParseOrbitError::MismatchedLengths`] if the arrays are not equally long
    pub fn new(
        timestamps: Vec<Epoch>,
        latitudes: Vec<Degree>,
        longitudes: Vec<Degree>,
        radii: Vec<Meter>,
        b_nec: Vec<Vector3<NanoTesla>>,
    ) -> Result<Self, ParseOrbitError> {
        let expected = timestamps.len();
        for (array, found) in [
            ("Latitude", latitudes.len()),
            ("Longitude", longitudes.len()),
            ("Radius", radii.len()),
            ("B_NEC", b_nec.len()),
        ] {
            if found != expected {
                return Err(ParseOrbitError::MismatchedLengths {
                    array,
                    expected,
                    found,
                });
            }
        }
        Ok(OrbitArrays {
            timestamps,
            latitudes,
            longitudes,
            radii,
            b_nec,
        })
    }

    pub fn push(&mut self, record: OrbitRecord) {
        self.timestamps.push(record.timestamp);
        self.latitudes.push(record.latitude_geocentric);
        self.longitudes.push(record.longitude_geocentric);
        self.radii.push(record.radius);
        self.b_nec.push(record.b_nec);
    }

    /// Read a pass from any CSV stream.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ParseOrbitError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut arrays = OrbitArrays::default();

        for (row, result) in csv_reader.deserialize::<CsvOrbitRow>().enumerate() {
            let raw = result?;
            let timestamp = parse_utc_timestamp(&raw.timestamp).ok_or_else(|| {
                ParseOrbitError::InvalidTimestamp {
                    row: row + 1,
                    value: raw.timestamp.clone(),
                }
            })?;
            arrays.push(OrbitRecord {
                timestamp,
                latitude_geocentric: raw.latitude,
                longitude_geocentric: raw.longitude,
                radius: raw.radius,
                b_nec: Vector3::new(raw.b_n, raw.b_e, raw.b_c),
            });
        }
        Ok(arrays)
    }

    /// Read a pass from a CSV file.
    pub fn from_csv_path(path: &Utf8Path) -> Result<Self, ParseOrbitError> {
        let file = std::fs::File::open(path)
            .map_err(|e| ParseOrbitError::Unreadable(format!("{path}: {e}")))?;
        Self::from_csv_reader(file)
    }
}

impl FromIterator<OrbitRecord> for OrbitArrays {
    fn from_iter<I: IntoIterator<Item = OrbitRecord>>(iter: I) -> Self {
        let mut arrays = OrbitArrays::default();
        for record in iter {
            arrays.push(record);
        }
        arrays
    }
}

impl OrbitSource for OrbitArrays {
    fn timestamps(&self) -> &[Epoch] {
        &self.timestamps
    }

    fn latitudes(&self) -> &[Degree] {
        &self.latitudes
    }

    fn longitudes(&self) -> &[Degree] {
        &self.longitudes
    }

    fn radii(&self) -> &[Meter] {
        &self.radii
    }

    fn b_nec(&self) -> &[Vector3<NanoTesla>] {
        &self.b_nec
    }
}

#[cfg(test)]
mod orbit_reader_test {
    use super::*;
    use crate::time::format_hms;

    const CSV: &str = "\
Timestamp,Latitude,Longitude,Radius,B_N,B_E,B_C
2021-04-11T06:30:00Z,45.1,10.2,6828137.0,20123.4,1832.1,41250.7
2021-04-11T06:30:01Z,45.2,10.2,6828140.0,20100.0,1830.0,41260.0
";

    #[test]
    fn test_from_csv_reader() {
        let pass = OrbitArrays::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(pass.len(), 2);
        let second = pass.record(1).unwrap();
        assert_eq!(format_hms(&second.timestamp), "06:30:01");
        assert_eq!(second.latitude_geocentric, 45.2);
        assert_eq!(second.radius, 6828140.0);
        assert_eq!(second.b_east(), 1830.0);
        assert!(pass.record(2).is_none());
    }

    #[test]
    fn test_invalid_timestamp() {
        let csv = "Timestamp,Latitude,Longitude,Radius,B_N,B_E,B_C\nnoon,1,2,3,4,5,6\n";
        assert_eq!(
            OrbitArrays::from_csv_reader(csv.as_bytes()),
            Err(ParseOrbitError::InvalidTimestamp {
                row: 1,
                value: "noon".into()
            })
        );
    }

    #[test]
    fn test_out_of_range_second_is_an_error() {
        let csv = "Timestamp,Latitude,Longitude,Radius,B_N,B_E,B_C
2021-04-11T06:30:00Z,1,2,3,4,5,6
2021-04-11T06:30:60Z,1,2,3,4,5,6
";
        assert_eq!(
            OrbitArrays::from_csv_reader(csv.as_bytes()),
            Err(ParseOrbitError::InvalidTimestamp {
                row: 2,
                value: "2021-04-11T06:30:60Z".into()
            })
        );
    }

    #[test]
    fn test_malformed_csv() {
        let csv = "Timestamp,Latitude,Longitude,Radius,B_N,B_E,B_C\n2021-04-11T06:30:00Z,north,2,3,4,5,6\n";
        assert!(matches!(
            OrbitArrays::from_csv_reader(csv.as_bytes()),
            Err(ParseOrbitError::Csv(_))
        ));
    }

    #[test]
    fn test_mismatched_lengths() {
        let epoch = parse_utc_timestamp("2021-04-11T06:30:00").unwrap();
        let err = OrbitArrays::new(
            vec![epoch, epoch],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
            vec![6.8e6],
            vec![Vector3::zeros(); 2],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseOrbitError::MismatchedLengths {
                array: "Radius",
                expected: 2,
                found: 1
            }
        );
    }
}
