//! # Epoch handling
//!
//! Both data sources must hand the model service a **decimal year**. The two
//! historical processing chains disagreed on how to compute it, so the crate keeps
//! both conventions, explicitly labelled by [`EpochMode`]:
//!
//! * [`EpochMode::DayOfYear365`] – `year + day_of_year / 365.0`. Day-level
//!   resolution, no leap-year handling (a leap year's Dec 31st maps past the next
//!   year's Jan 1st). Default for observatory batches.
//! * [`EpochMode::Exact`] – fraction of the calendar year elapsed at the instant,
//!   leap-year aware. Default for satellite passes.
//!
//! Timestamps are parsed into [`hifitime::Epoch`] in the UTC time scale.
use std::str::FromStr;

use hifitime::{Epoch, Unit};
use serde::{Deserialize, Serialize};

use crate::constants::{DecimalYear, DAYS_PER_YEAR_APPROX};

/// Decimal-year convention applied to a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpochMode {
    /// `year + day_of_year / 365.0`
    DayOfYear365,
    /// Fraction of the calendar year elapsed, leap-year aware.
    Exact,
}

impl EpochMode {
    /// Decimal year of `epoch` under this convention.
    pub fn decimal_year(&self, epoch: &Epoch) -> DecimalYear {
        match self {
            EpochMode::DayOfYear365 => {
                day_of_year_decimal_year(calendar_year(epoch), day_of_year(epoch))
            }
            EpochMode::Exact => exact_decimal_year(epoch),
        }
    }
}

/// Observatory epoch approximation: `year + day_of_year / 365.0`.
///
/// Arguments
/// ---------
/// * `year`: calendar year
/// * `day_of_year`: 1-based day of year, as written in the `DOY` column
///
/// Return
/// ------
/// * the approximate decimal year (leap years are deliberately not special-cased)
pub fn day_of_year_decimal_year(year: i32, day_of_year: u16) -> DecimalYear {
    year as f64 + day_of_year as f64 / DAYS_PER_YEAR_APPROX
}

/// Exact fractional year of an instant.
///
/// The fraction is the elapsed time since Jan 1st 00:00 UTC divided by the length of
/// the calendar year, so 366-day years are handled.
pub fn exact_decimal_year(epoch: &Epoch) -> DecimalYear {
    let year = calendar_year(epoch);
    let start = Epoch::from_gregorian_utc_at_midnight(year, 1, 1);
    let end = Epoch::from_gregorian_utc_at_midnight(year + 1, 1, 1);
    year as f64 + (*epoch - start).to_seconds() / (end - start).to_seconds()
}

/// UTC calendar year of an epoch.
pub fn calendar_year(epoch: &Epoch) -> i32 {
    epoch.to_gregorian_utc().0
}

/// 1-based UTC day of year of an epoch.
pub fn day_of_year(epoch: &Epoch) -> u16 {
    let start = Epoch::from_gregorian_utc_at_midnight(calendar_year(epoch), 1, 1);
    (*epoch - start).to_unit(Unit::Day).floor() as u16 + 1
}

/// Build a UTC epoch from a `YYYY-MM-DD` date and an optional `HH:MM:SS[.fff]` time
/// of day (midnight when absent).
///
/// Return
/// ------
/// * `None` if hifitime rejects the date or the time (out of range fields included)
pub fn utc_epoch(date: &str, time: Option<&str>) -> Option<Epoch> {
    let time = time.map_or("00:00:00", str::trim);
    Epoch::from_str(&format!("{}T{time} UTC", date.trim())).ok()
}

/// Parse an ISO-8601 UTC timestamp (`YYYY-MM-DDTHH:MM:SS[.fff][Z]`, a space is also
/// accepted as the date/time separator).
pub fn parse_utc_timestamp(timestamp: &str) -> Option<Epoch> {
    Epoch::from_str(timestamp.trim()).ok()
}

/// `HH:MM:SS` label of an epoch, in UTC.
pub fn format_hms(epoch: &Epoch) -> String {
    let (_, _, _, hour, minute, second, _) = epoch.to_gregorian_utc();
    format!("{hour:02}:{minute:02}:{second:02}")
}

/// `YYYY-MM-DD` label of an epoch, in UTC.
pub fn format_date(epoch: &Epoch) -> String {
    let (year, month, day, ..) = epoch.to_gregorian_utc();
    format!("{year:04}-{month:02}-{day:02}")
}
