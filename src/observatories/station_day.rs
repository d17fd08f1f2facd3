//! # Station-day estimation
//!
//! Reduce one parsed IAGA-2002 file to a single daily declination.
//!
//! ## Column selection
//!
//! Stations do not all publish the same components. The declination source is picked
//! in priority order:
//!
//! 1. `<code>D`: declination published directly,
//! 2. `<code>E`: used as is when no `D` column exists,
//! 3. `<code>X` and `<code>Y`: declination computed as `atan(Y / X)`.
//!
//! A row is valid when the selected column(s) do not carry the IAGA sentinel
//! ([`IAGA_SENTINEL`]). Rows whose `X`/`Y` pair has no defined declination are dropped
//! as well (see [`declination_from_components`]).
//!
//! ## Epoch
//!
//! The epoch of the station-day comes from the `DATE`/`DOY` fields of the first valid
//! row, under the configured [`EpochMode`].
use log::debug;

use crate::{
    constants::{Degree, DecimalYear, Kilometer, IAGA_SENTINEL},
    conversion::{elevation_to_km, normalize_longitude},
    dataset::{MeasuredUnit, SourceType},
    declination::{declination_from_components, DeclinationStats},
    magdecl_errors::MagDeclError,
    model_client::ModelQuery,
    time::{calendar_year, day_of_year_decimal_year, exact_decimal_year, utc_epoch, EpochMode},
};

use super::iaga_reader::{IagaFile, IagaRow, ParseIagaError};

/// Column(s) a station-day declination is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclinationSource {
    /// index of the `D` column
    Direct(usize),
    /// index of the `E` column
    Proxy(usize),
    /// indices of the `X` and `Y` columns
    Components { x: usize, y: usize },
}

impl DeclinationSource {
    /// Pick the declination source of a file, `D` first, then `E`, then `X`/`Y`.
    pub fn select(file: &IagaFile) -> Result<Self, ParseIagaError> {
        if let Some(d) = file.component_column('D')? {
            return Ok(DeclinationSource::Direct(d));
        }
        if let Some(e) = file.component_column('E')? {
            return Ok(DeclinationSource::Proxy(e));
        }
        let code = file.header.require_code()?;
        let x = file
            .component_column('X')?
            .ok_or_else(|| ParseIagaError::MissingColumn(format!("{code}X")))?;
        let y = file
            .component_column('Y')?
            .ok_or_else(|| ParseIagaError::MissingColumn(format!("{code}Y")))?;
        Ok(DeclinationSource::Components { x, y })
    }

    /// `true` if none of the active fields of `row` carries the sentinel.
    pub fn is_valid(&self, row: &IagaRow) -> bool {
        match *self {
            DeclinationSource::Direct(idx) | DeclinationSource::Proxy(idx) => {
                is_valid_value(row.values[idx])
            }
            DeclinationSource::Components { x, y } => {
                is_valid_value(row.values[x]) && is_valid_value(row.values[y])
            }
        }
    }

    /// Declination of a valid row, in degrees.
    pub fn declination(&self, row: &IagaRow) -> Result<Degree, MagDeclError> {
        match *self {
            DeclinationSource::Direct(idx) | DeclinationSource::Proxy(idx) => Ok(row.values[idx]),
            DeclinationSource::Components { x, y } => {
                declination_from_components(row.values[x], row.values[y])
            }
        }
    }
}

/// `false` for the IAGA missing-data sentinel.
pub fn is_valid_value(value: f64) -> bool {
    value != IAGA_SENTINEL
}

/// Daily declination of one station.
#[derive(Debug, Clone, PartialEq)]
pub struct StationDay {
    pub iaga_code: String,
    /// station name, falling back to the IAGA code
    pub station_name: String,
    /// `DATE` of the first valid row
    pub date: String,
    pub epoch: DecimalYear,
    /// header latitude, degrees
    pub latitude: Degree,
    /// header longitude, `[0, 360)` convention kept
    pub longitude: Degree,
    pub altitude_km: Kilometer,
    pub source: DeclinationSource,
    pub stats: DeclinationStats,
    /// rows dropped because of the sentinel or an undefined declination
    pub rejected_rows: usize,
}

impl StationDay {
    /// Attach the batch sequence number and build the query sent to the model service.
    pub fn into_measured(self, sequence: usize) -> MeasuredUnit {
        let query = ModelQuery {
            latitude: self.latitude,
            longitude: normalize_longitude(self.longitude),
            altitude: self.altitude_km,
            year: self.epoch,
        };
        MeasuredUnit {
            sequence,
            source_id: self.station_name,
            source_type: SourceType::Observatory,
            label: self.date,
            epoch: self.epoch,
            latitude: self.latitude,
            longitude: self.longitude,
            altitude_km: self.altitude_km,
            declination_measured: self.stats.mean,
            uncertainty: self.stats.std_error,
            query,
            epoch_flagged: false,
        }
    }
}

fn row_epoch(row: &IagaRow, mode: EpochMode) -> Result<DecimalYear, ParseIagaError> {
    let invalid_date = || ParseIagaError::InvalidValue {
        line: row.line,
        column: "DATE".into(),
        value: row.date.clone(),
    };
    let midnight = utc_epoch(&row.date, None).ok_or_else(invalid_date)?;
    match mode {
        EpochMode::DayOfYear365 => Ok(day_of_year_decimal_year(
            calendar_year(&midnight),
            row.day_of_year,
        )),
        EpochMode::Exact => Ok(exact_decimal_year(&midnight)),
    }
}

/// Estimate the daily declination of a parsed IAGA-2002 file.
///
/// Arguments
/// ---------
/// * `file`: the parsed file
/// * `epoch_mode`: decimal-year convention of the station-day epoch
///
/// Return
/// ------
/// * the station-day estimate
/// * [`MagDeclError::ParseIaga`] if a required header field or column is missing
/// * [`MagDeclError::NoValidRows`] if every row is invalid
pub fn estimate_station_day(
    file: &IagaFile,
    epoch_mode: EpochMode,
) -> Result<StationDay, MagDeclError> {
    let iaga_code = file.header.require_code()?.to_string();
    let latitude = file.header.require_latitude()?;
    let longitude = file.header.require_longitude()?;
    let source = DeclinationSource::select(file)?;

    let mut first_valid: Option<&IagaRow> = None;
    let mut declinations = Vec::with_capacity(file.rows.len());
    for row in file.rows.iter().filter(|row| source.is_valid(row)) {
        match source.declination(row) {
            Ok(declination) => {
                first_valid.get_or_insert(row);
                declinations.push(declination);
            }
            Err(err) => debug!("{iaga_code}: line {} dropped: {err}", row.line),
        }
    }

    let (Some(first), Some(stats)) = (first_valid, DeclinationStats::from_samples(&declinations))
    else {
        return Err(MagDeclError::NoValidRows(iaga_code));
    };

    Ok(StationDay {
        station_name: file
            .header
            .display_name()
            .unwrap_or(&iaga_code)
            .to_string(),
        date: first.date.clone(),
        epoch: row_epoch(first, epoch_mode)?,
        latitude,
        longitude,
        altitude_km: elevation_to_km(file.header.elevation),
        source,
        stats,
        rejected_rows: file.rows.len() - declinations.len(),
        iaga_code,
    })
}

#[cfg(test)]
mod station_day_test {
    use super::*;
    use crate::observatories::iaga_reader::parse_iaga_str;
    use approx::assert_relative_eq;

    const HEADER: &str = "\
 Station Name           Test Station                                 |
 IAGA Code              TST                                          |
 Geodetic Latitude      45.0                                         |
 Geodetic Longitude     270.0                                        |
 Elevation              1500                                         |
";

    fn file_with_table(table: &str) -> IagaFile {
        parse_iaga_str(&format!("{HEADER}{table}")).unwrap()
    }

    #[test]
    fn test_direct_declination_wins() {
        let file = file_with_table(
            "DATE       TIME         DOY     TSTX      TSTY      TSTD   |
2021-04-11 00:00:00.000 101     1.0       1.0       3.0
2021-04-11 00:01:00.000 101     1.0       1.0       3.4
",
        );
        let day = estimate_station_day(&file, EpochMode::DayOfYear365).unwrap();
        assert_eq!(day.source, DeclinationSource::Direct(2));
        assert_relative_eq!(day.stats.mean, 3.2, epsilon = 1e-12);
        // population std 0.2, n - 1 = 1
        assert_relative_eq!(day.stats.std_error.unwrap(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(day.epoch, 2021.0 + 101.0 / 365.0, epsilon = 1e-12);
        assert_eq!(day.altitude_km, 1.5);
        assert_eq!(day.station_name, "Test Station");
    }

    #[test]
    fn test_proxy_column() {
        let file = file_with_table(
            "DATE       TIME         DOY     TSTX      TSTE   |
2021-04-11 00:00:00.000 101     1.0       -2.5
",
        );
        let day = estimate_station_day(&file, EpochMode::DayOfYear365).unwrap();
        assert_eq!(day.source, DeclinationSource::Proxy(1));
        assert_eq!(day.stats.mean, -2.5);
        assert_eq!(day.stats.std_error, None);
    }

    #[test]
    fn test_sentinel_rows_excluded() {
        let file = file_with_table(
            "DATE       TIME         DOY     TSTX      TSTY   |
2021-04-11 00:00:00.000 101     99999.00  1.0
2021-04-11 00:01:00.000 101     1.0       1.0
2021-04-11 00:02:00.000 101     0.0       0.0
2021-04-11 00:03:00.000 101     1.0       99999.00
",
        );
        let day = estimate_station_day(&file, EpochMode::DayOfYear365).unwrap();
        assert_eq!(day.stats.count, 1);
        assert_eq!(day.rejected_rows, 3);
        assert_relative_eq!(day.stats.mean, 45.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_valid_rows() {
        let file = file_with_table(
            "DATE       TIME         DOY     TSTD   |
2021-04-11 00:00:00.000 101     99999.00
",
        );
        assert_eq!(
            estimate_station_day(&file, EpochMode::DayOfYear365),
            Err(MagDeclError::NoValidRows("TST".into()))
        );
    }

    #[test]
    fn test_missing_components() {
        let file = file_with_table(
            "DATE       TIME         DOY     TSTZ   |
2021-04-11 00:00:00.000 101     40000.0
",
        );
        assert_eq!(
            estimate_station_day(&file, EpochMode::DayOfYear365),
            Err(MagDeclError::ParseIaga(ParseIagaError::MissingColumn(
                "TSTX".into()
            )))
        );
    }

    #[test]
    fn test_exact_epoch_and_query() {
        let file = file_with_table(
            "DATE       TIME         DOY     TSTD   |
2021-04-11 00:00:00.000 101     3.2
",
        );
        let day = estimate_station_day(&file, EpochMode::Exact).unwrap();
        assert_relative_eq!(day.epoch, 2021.0 + 100.0 / 365.0, epsilon = 1e-9);

        let unit = day.into_measured(7);
        assert_eq!(unit.sequence, 7);
        assert_eq!(unit.longitude, 270.0);
        assert_eq!(unit.query.longitude, -90.0);
        assert_eq!(unit.query.altitude, 1.5);
        assert_eq!(unit.label, "2021-04-11");
    }
}
