//! Historical station records used for Weibull fitting
//!
//! Station exports (e.g. airport METAR archives) are CSV files with a
//! timestamp, a wind speed in miles per hour and a wind direction. Gaps are
//! common, so missing values are back-filled from the next observation and
//! then forward-filled from the previous one.

use super::series::{WindRecord, WindSeries};
use crate::core_types::{Degrees, MetersPerSecond, MilesPerHour};
use crate::error::InputError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M",
];

/// Column names of a historical wind export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryColumns {
    /// Timestamp column
    pub datetime: String,
    /// Wind speed column (mph)
    pub speed: String,
    /// Wind direction column (degrees)
    pub direction: String,
}

impl Default for HistoryColumns {
    fn default() -> Self {
        Self {
            datetime: "datetime".to_string(),
            speed: "windspeed".to_string(),
            direction: "winddir".to_string(),
        }
    }
}

/// Read a historical wind export into m/s records ready for Weibull fitting
///
/// Speeds are converted from mph; calm hours (0 mph) are raised to
/// [`MetersPerSecond::WEIBULL_FLOOR`] since a Weibull sample must be positive.
///
/// # Errors
/// Returns `InputError::MissingFile` if the file does not exist,
/// `InputError::Csv` if a column is absent, a timestamp cannot be parsed, or
/// a column holds no value at all, and `InputError::EmptyFile` for an export
/// without rows.
pub fn read_history(path: &Path, columns: &HistoryColumns) -> Result<WindSeries, InputError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| InputError::csv(path, &e))?;
    let headers = reader
        .headers()
        .map_err(|e| InputError::csv(path, &e))?
        .clone();

    let column = |name: &str| -> Result<usize, InputError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| InputError::Csv {
                path: path.to_path_buf(),
                msg: format!("missing column '{name}'"),
            })
    };
    let datetime_col = column(&columns.datetime)?;
    let speed_col = column(&columns.speed)?;
    let direction_col = column(&columns.direction)?;

    let mut days = Vec::new();
    let mut speeds = Vec::new();
    let mut directions = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InputError::csv(path, &e))?;
        let stamp = record.get(datetime_col).unwrap_or_default();
        let day = parse_day_of_year(stamp).ok_or_else(|| InputError::Csv {
            path: path.to_path_buf(),
            msg: format!("row {row}: cannot parse timestamp '{stamp}'"),
        })?;
        days.push(day);
        speeds.push(parse_optional(record.get(speed_col)));
        directions.push(parse_optional(record.get(direction_col)));
    }

    if days.is_empty() {
        return Err(InputError::EmptyFile(path.to_path_buf()));
    }

    let filled_speed = fill_gaps(&mut speeds);
    let filled_direction = fill_gaps(&mut directions);
    if filled_speed.is_none() || filled_direction.is_none() {
        return Err(InputError::Csv {
            path: path.to_path_buf(),
            msg: "wind speed or direction column holds no values".to_string(),
        });
    }
    debug!(
        path = %path.display(),
        filled_speed = filled_speed.unwrap_or_default(),
        filled_direction = filled_direction.unwrap_or_default(),
        "Filled gaps in historical wind data"
    );

    let records: Vec<WindRecord> = days
        .into_iter()
        .zip(speeds)
        .zip(directions)
        .map(|((day_of_year, speed), direction)| {
            let speed = MilesPerHour::new(speed.unwrap_or_default()).to_mps();
            let speed = if *speed <= 0.0 {
                MetersPerSecond::WEIBULL_FLOOR
            } else {
                speed
            };
            WindRecord {
                day_of_year,
                speed,
                direction: Degrees::new(direction.unwrap_or_default()),
            }
        })
        .collect();

    info!(path = %path.display(), records = records.len(), "Read historical wind data");
    Ok(WindSeries::new(records))
}

fn parse_optional(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_day_of_year(stamp: &str) -> Option<u32> {
    let stamp = stamp.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(stamp, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(stamp, "%Y-%m-%d").ok())
        .map(|d| d.ordinal())
}

/// Back-fill then forward-fill missing values in place
///
/// Returns the number of filled entries, or `None` if every entry is missing.
fn fill_gaps(values: &mut [Option<f64>]) -> Option<usize> {
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing == values.len() {
        return None;
    }

    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
    let mut prev = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => prev = Some(*x),
            None => *v = prev,
        }
    }
    Some(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_fill_gaps_backward_then_forward() {
        let mut values = vec![None, Some(1.0), None, None, Some(4.0), None];
        assert_eq!(fill_gaps(&mut values), Some(4));
        assert_eq!(
            values,
            vec![Some(1.0), Some(1.0), Some(4.0), Some(4.0), Some(4.0), Some(4.0)]
        );

        let mut empty = vec![None, None];
        assert_eq!(fill_gaps(&mut empty), None);
    }

    #[test]
    fn test_parse_day_of_year_formats() {
        assert_eq!(parse_day_of_year("2019-02-01 13:00:00"), Some(32));
        assert_eq!(parse_day_of_year("2019-02-01T13:00"), Some(32));
        assert_eq!(parse_day_of_year("01/02/2019 13:00"), Some(32));
        assert_eq!(parse_day_of_year("2019-12-31"), Some(365));
        assert_eq!(parse_day_of_year("yesterday"), None);
    }

    #[test]
    fn test_read_history_converts_and_fills() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(
            &path,
            "station,datetime,windspeed,winddir\n\
             EGLL,2019-01-01 00:00:00,10,270\n\
             EGLL,2019-01-01 01:00:00,,NaN\n\
             EGLL,2019-01-01 02:00:00,0,90\n",
        )
        .unwrap();

        let series = read_history(&path, &HistoryColumns::default()).unwrap();
        assert_eq!(series.len(), 3);

        let r = series.records();
        assert!((*r[0].speed - 4.4704).abs() < 1e-9);
        // Gap back-filled from the calm hour, then floored
        assert_eq!(r[1].speed, MetersPerSecond::WEIBULL_FLOOR);
        assert_eq!(r[1].direction, Degrees::new(90.0));
        assert_eq!(r[2].speed, MetersPerSecond::WEIBULL_FLOOR);
        assert_eq!(r[0].day_of_year, 1);
    }

    #[test]
    fn test_read_history_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "datetime,speed,winddir\n2019-01-01 00:00:00,10,270\n").unwrap();
        let err = read_history(&path, &HistoryColumns::default()).unwrap_err();
        assert!(matches!(err, InputError::Csv { .. }), "{err}");
    }
}
