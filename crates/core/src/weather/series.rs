//! Wind time series and direction binning

use super::season::ClimatePeriod;
use crate::core_types::{AngleSet, Degrees, MetersPerSecond};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Hours in a typical meteorological year
pub const HOURS_PER_YEAR: usize = 8760;

/// One weather observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindRecord {
    /// 1-based day of year
    pub day_of_year: u32,
    /// Wind speed at the weather station
    pub speed: MetersPerSecond,
    /// Direction the wind blows from
    pub direction: Degrees,
}

/// Ordered wind observations from one weather source
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindSeries {
    records: Vec<WindRecord>,
    /// Day of year of every hour the source lists without usable wind data
    #[serde(default)]
    missing_days: Vec<u32>,
}

impl WindSeries {
    /// Wrap a list of records
    pub fn new(records: Vec<WindRecord>) -> Self {
        Self {
            records,
            missing_days: Vec::new(),
        }
    }

    /// Records plus the days of hours whose wind data is missing
    ///
    /// Missing hours carry no speed but still count towards the hours of
    /// their period.
    pub fn with_missing(records: Vec<WindRecord>, missing_days: Vec<u32>) -> Self {
        Self {
            records,
            missing_days,
        }
    }

    /// Hours without usable wind data
    #[inline]
    pub fn missing_hours(&self) -> usize {
        self.missing_days.len()
    }

    /// All records
    #[inline]
    pub fn records(&self) -> &[WindRecord] {
        &self.records
    }

    /// Number of records
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the series holds no records
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Mean wind speed, used as the reference speed of the CFD inlet
    pub fn mean_speed(&self) -> Option<MetersPerSecond> {
        if self.records.is_empty() {
            return None;
        }
        let sum: f64 = self.records.iter().map(|r| *r.speed).sum();
        Some(MetersPerSecond::new(sum / self.records.len() as f64))
    }

    /// Sort the speeds of a period into direction buckets
    pub fn bin(&self, angles: &AngleSet, period: ClimatePeriod) -> DirectionalSamples {
        let mut per_angle = vec![Vec::new(); angles.len()];
        let mut total = 0;
        let mut unassigned = 0;

        for record in self
            .records
            .iter()
            .filter(|r| period.contains_day(r.day_of_year))
        {
            total += 1;
            match angles.bucket_of(record.direction) {
                Some(i) => per_angle[i].push(*record.speed),
                None => unassigned += 1,
            }
        }

        if unassigned > 0 {
            warn!(
                period = %period,
                unassigned,
                total,
                "Weather records outside every direction bucket were dropped"
            );
        }

        let missing = self
            .missing_days
            .iter()
            .filter(|&&day| period.contains_day(day))
            .count();

        DirectionalSamples {
            period,
            per_angle,
            total,
            unassigned,
            missing,
        }
    }
}

/// Wind speeds of one period, grouped by direction bucket
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalSamples {
    /// Period the records were drawn from
    pub period: ClimatePeriod,
    /// Speeds (m/s) per angle, in angle order
    pub per_angle: Vec<Vec<f64>>,
    /// Records in the period, including unassigned ones
    pub total: usize,
    /// Records that fell outside every bucket
    pub unassigned: usize,
    /// Hours of the period listed without wind data, not part of `total`
    pub missing: usize,
}

impl DirectionalSamples {
    /// Hours the period spans in the source: records plus missing hours
    #[inline]
    pub fn hours(&self) -> usize {
        self.total + self.missing
    }
}
