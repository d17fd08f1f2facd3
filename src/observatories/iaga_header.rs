//! # IAGA-2002 header block
//!
//! Header lines are made of a fixed-width key field (the first
//! [`IAGA_HEADER_KEY_WIDTH`] characters) followed by a free-text value, usually
//! terminated by a `|` separator:
//!
//! ```text
//!  Station Name           Boulder                                      |
//!  IAGA Code              BOU                                          |
//!  Geodetic Latitude      40.137                                       |
//! ```
//!
//! Two representations are provided:
//!
//! * [`HeaderRecord`] – the loosely typed key/value view, with normalized keys
//!   (internal whitespace collapsed, lowercased) and cleaned values (no `|` token,
//!   tokens joined by a single space),
//! * [`IagaHeader`] – the typed descriptor exposing the fields the pipeline needs,
//!   every other entry being kept in [`IagaHeader::extensions`].
use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Meter, IAGA_HEADER_KEY_WIDTH, IAGA_SEPARATOR};

use super::iaga_reader::ParseIagaError;

const KEY_IAGA_CODE: &str = "iaga code";
const KEY_STATION_NAME: &str = "station name";
const KEY_STATION: &str = "station";
const KEY_LATITUDE: &str = "geodetic latitude";
const KEY_LONGITUDE: &str = "geodetic longitude";
const KEY_ELEVATION: &str = "elevation";

/// Split a header line into its normalized `(key, value)` pair.
///
/// Arguments
/// ---------
/// * `line`: one raw header line
///
/// Return
/// ------
/// * the key, whitespace-collapsed and lowercased
/// * the value, with every `|` token removed and the remaining tokens joined by a
///   single space
pub fn split_header_line(line: &str) -> (String, String) {
    let split_at = line
        .char_indices()
        .nth(IAGA_HEADER_KEY_WIDTH)
        .map(|(idx, _)| idx)
        .unwrap_or(line.len());
    let (raw_key, raw_value) = line.split_at(split_at);

    let key = raw_key.split_whitespace().join(" ").to_lowercase();
    let value = raw_value
        .split_whitespace()
        .filter(|token| *token != IAGA_SEPARATOR)
        .join(" ");
    (key, value)
}

/// Normalized key/value view of a header block.
///
/// A key written twice keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeaderRecord {
    entries: BTreeMap<String, String>,
}

impl HeaderRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and store one raw header line.
    pub fn push_line(&mut self, line: &str) {
        let (key, value) = split_header_line(line);
        if !key.is_empty() {
            self.entries.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for HeaderRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        HeaderRecord {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Typed header of an IAGA-2002 file.
///
/// Fields
/// ------
/// * `iaga_code`: station code, prefix of the component column names (e.g. `BOU`)
/// * `station_name`: from `Station Name`, or from `Station` for the stations that
///   label it that way
/// * `geodetic_latitude`, `geodetic_longitude`: degrees, longitude in `[0, 360)`
/// * `elevation`: meters, `None` if absent or blank
/// * `extensions`: every other header entry (format, source, sensor orientation…)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IagaHeader {
    pub iaga_code: Option<String>,
    pub station_name: Option<String>,
    pub geodetic_latitude: Option<Degree>,
    pub geodetic_longitude: Option<Degree>,
    pub elevation: Option<Meter>,
    pub extensions: BTreeMap<String, String>,
}

impl IagaHeader {
    /// The station code, required to locate the component columns.
    pub fn require_code(&self) -> Result<&str, ParseIagaError> {
        self.iaga_code
            .as_deref()
            .ok_or(ParseIagaError::MissingHeaderField(KEY_IAGA_CODE))
    }

    pub fn require_latitude(&self) -> Result<Degree, ParseIagaError> {
        self.geodetic_latitude
            .ok_or(ParseIagaError::MissingHeaderField(KEY_LATITUDE))
    }

    pub fn require_longitude(&self) -> Result<Degree, ParseIagaError> {
        self.geodetic_longitude
            .ok_or(ParseIagaError::MissingHeaderField(KEY_LONGITUDE))
    }

    /// Human readable station identifier: the station name, or the IAGA code when the
    /// file carries no name.
    pub fn display_name(&self) -> Option<&str> {
        self.station_name.as_deref().or(self.iaga_code.as_deref())
    }
}

fn parse_optional_number(key: &str, value: Option<&str>) -> Result<Option<f64>, ParseIagaError> {
    match value {
        None | Some("") => Ok(None),
        Some(text) => text
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ParseIagaError::InvalidHeaderValue {
                key: key.to_string(),
                value: text.to_string(),
            }),
    }
}

impl TryFrom<HeaderRecord> for IagaHeader {
    type Error = ParseIagaError;

    fn try_from(record: HeaderRecord) -> Result<Self, Self::Error> {
        let non_empty = |key: &str| record.get(key).filter(|v| !v.is_empty()).map(str::to_string);

        let iaga_code = non_empty(KEY_IAGA_CODE);
        let station_name = non_empty(KEY_STATION_NAME).or_else(|| non_empty(KEY_STATION));
        let geodetic_latitude = parse_optional_number(KEY_LATITUDE, record.get(KEY_LATITUDE))?;
        let geodetic_longitude = parse_optional_number(KEY_LONGITUDE, record.get(KEY_LONGITUDE))?;
        let elevation = parse_optional_number(KEY_ELEVATION, record.get(KEY_ELEVATION))?;

        let known = [
            KEY_IAGA_CODE,
            KEY_STATION_NAME,
            KEY_STATION,
            KEY_LATITUDE,
            KEY_LONGITUDE,
            KEY_ELEVATION,
        ];
        let extensions = record
            .entries
            .into_iter()
            .filter(|(key, _)| !known.contains(&key.as_str()))
            .collect();

        Ok(IagaHeader {
            iaga_code,
            station_name,
            geodetic_latitude,
            geodetic_longitude,
            elevation,
            extensions,
        })
    }
}

#[cfg(test)]
mod iaga_header_test {
    use super::*;

    #[test]
    fn test_split_header_line() {
        let (key, value) = split_header_line(
            " Station   Name         Boulder   Colorado                           |",
        );
        assert_eq!(key, "station name");
        assert_eq!(value, "Boulder Colorado");

        let (key, value) = split_header_line(" IAGA CODE              BOU   |");
        assert_eq!(key, "iaga code");
        assert_eq!(value, "BOU");
    }

    #[test]
    fn test_separator_never_survives() {
        let (_, value) = split_header_line(" Reported               XYZF | |  ");
        assert_eq!(value, "XYZF");
        let (_, value) = split_header_line(" Elevation              |");
        assert_eq!(value, "");
    }

    #[test]
    fn test_short_line() {
        let (key, value) = split_header_line(" Format");
        assert_eq!(key, "format");
        assert_eq!(value, "");
    }

    #[test]
    fn test_typed_header() {
        let mut record = HeaderRecord::new();
        for line in [
            " Format                 IAGA-2002                                    |",
            " Source of Data         Geological Survey of Canada (GSC)            |",
            " Station                Ottawa                                       |",
            " IAGA Code              OTT                                          |",
            " Geodetic Latitude      45.403                                       |",
            " Geodetic Longitude     284.448                                      |",
            " Elevation                                                           |",
        ] {
            record.push_line(line);
        }
        assert!(record.iter().all(|(k, _)| k == k.to_lowercase()));

        let header = IagaHeader::try_from(record).unwrap();
        assert_eq!(header.iaga_code.as_deref(), Some("OTT"));
        assert_eq!(header.station_name.as_deref(), Some("Ottawa"));
        assert_eq!(header.geodetic_latitude, Some(45.403));
        assert_eq!(header.geodetic_longitude, Some(284.448));
        assert_eq!(header.elevation, None);
        assert_eq!(
            header.extensions.get("source of data").map(String::as_str),
            Some("Geological Survey of Canada (GSC)")
        );
        assert_eq!(header.extensions.len(), 2);
    }

    #[test]
    fn test_invalid_latitude() {
        let record: HeaderRecord = [("geodetic latitude".to_string(), "north".to_string())]
            .into_iter()
            .collect();
        assert_eq!(
            IagaHeader::try_from(record),
            Err(ParseIagaError::InvalidHeaderValue {
                key: "geodetic latitude".into(),
                value: "north".into()
            })
        );
    }

    #[test]
    fn test_display_name_fallback() {
        let header = IagaHeader {
            iaga_code: Some("ABC".into()),
            ..Default::default()
        };
        assert_eq!(header.display_name(), Some("ABC"));
        assert_eq!(
            IagaHeader::default().require_code(),
            Err(ParseIagaError::MissingHeaderField("iaga code"))
        );
    }
}
