//! `EnergyPlus` weather (EPW) reader
//!
//! An EPW file holds eight header records followed by one record per hour of
//! a typical meteorological year. Only the fields needed for wind comfort are
//! read:
//!
//! | Field (1-based) | Content              |
//! |-----------------|----------------------|
//! | 2               | Month                |
//! | 3               | Day of month         |
//! | 21              | Wind direction (deg) |
//! | 22              | Wind speed (m/s)     |
//!
//! Hours flagged with the EPW missing markers (999 for speed, anything above
//! 360 for direction) carry no wind sample but are still counted as hours of
//! the year.

use super::series::{WindRecord, WindSeries, HOURS_PER_YEAR};
use crate::core_types::{Degrees, MetersPerSecond};
use crate::error::InputError;
use chrono::{Datelike, NaiveDate};
use std::path::Path;
use tracing::{info, warn};

/// Number of header records before the hourly data
const EPW_HEADER_RECORDS: usize = 8;

const FIELD_MONTH: usize = 1;
const FIELD_DAY: usize = 2;
const FIELD_WIND_DIRECTION: usize = 20;
const FIELD_WIND_SPEED: usize = 21;

/// EPW missing-value marker for wind speed
const MISSING_SPEED: f64 = 999.0;

/// Read the hourly wind records of an EPW file
///
/// # Errors
/// Returns `InputError::MissingFile` if the file does not exist,
/// `InputError::Csv` for truncated or non-numeric hourly records, and
/// `InputError::EmptyFile` if no usable hour remains.
pub fn read_epw(path: &Path) -> Result<WindSeries, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| InputError::csv(path, &e))?;

    let mut records = Vec::with_capacity(HOURS_PER_YEAR);
    let mut missing_days = Vec::new();

    for (line, record) in reader.records().enumerate().skip(EPW_HEADER_RECORDS) {
        let record = record.map_err(|e| InputError::csv(path, &e))?;
        let field = |idx: usize, name: &str| -> Result<f64, InputError> {
            record
                .get(idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .ok_or_else(|| InputError::Csv {
                    path: path.to_path_buf(),
                    msg: format!("line {}: missing or invalid {name}", line + 1),
                })
        };

        let month = field(FIELD_MONTH, "month")?;
        let day = field(FIELD_DAY, "day")?;
        let direction = field(FIELD_WIND_DIRECTION, "wind direction")?;
        let speed = field(FIELD_WIND_SPEED, "wind speed")?;

        let day_of_year = day_of_year(month as u32, day as u32).ok_or_else(|| InputError::Csv {
            path: path.to_path_buf(),
            msg: format!("line {}: invalid date {month}/{day}", line + 1),
        })?;

        if speed >= MISSING_SPEED || speed < 0.0 || !(0.0..=360.0).contains(&direction) {
            missing_days.push(day_of_year);
            continue;
        }

        records.push(WindRecord {
            day_of_year,
            speed: MetersPerSecond::new(speed),
            direction: Degrees::new(direction),
        });
    }

    if records.is_empty() {
        return Err(InputError::EmptyFile(path.to_path_buf()));
    }
    if !missing_days.is_empty() {
        warn!(
            path = %path.display(),
            missing = missing_days.len(),
            "EPW hours without wind data kept in the hour count"
        );
    }

    let series = WindSeries::with_missing(records, missing_days);
    info!(
        path = %path.display(),
        hours = series.len(),
        missing = series.missing_hours(),
        mean_speed = %series.mean_speed().unwrap_or_default(),
        "Read EPW wind data"
    );
    Ok(series)
}

/// Day of year for a month/day pair; typical years mix source years, so a
/// common year is assumed unless the date is 29 February.
fn day_of_year(month: u32, day: u32) -> Option<u32> {
    NaiveDate::from_ymd_opt(2021, month, day)
        .or_else(|| NaiveDate::from_ymd_opt(2020, month, day))
        .map(|d| d.ordinal())
}
