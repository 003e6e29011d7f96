//! Wind climate statistics for one classification pass
//!
//! A pass evaluates the comfort thresholds against the statistics of its own
//! period and the safety threshold against the annual statistics. Two
//! representations exist:
//!
//! - [`EmpiricalClimate`]: raw hourly speeds per direction bucket, counted
//! - [`ParametricClimate`]: one Weibull distribution per direction, integrated
//!
//! Both are wrapped in [`WindClimateSource`] so the exceedance calculation has
//! a single entry point.

use super::season::ClimatePeriod;
use super::series::{WindSeries, HOURS_PER_YEAR};
use super::weibull::{DirectionalWeibull, WeibullTable};
use crate::core_types::{AngleSet, MetersPerSecond};
use crate::criteria::ThresholdGroup;
use crate::error::InputError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Speeds of one period, bucketed by direction and sorted ascending
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalSlice {
    per_angle: Vec<Vec<f64>>,
    sample_count: usize,
    missing: usize,
}

impl EmpiricalSlice {
    /// Bucket the records of `period`
    pub fn from_series(series: &WindSeries, angles: &AngleSet, period: ClimatePeriod) -> Self {
        let samples = series.bin(angles, period);
        let mut per_angle = samples.per_angle;
        for speeds in &mut per_angle {
            speeds.sort_by(f64::total_cmp);
        }
        Self {
            per_angle,
            sample_count: samples.total,
            missing: samples.missing,
        }
    }

    /// Sorted speeds of one direction bucket
    #[inline]
    pub fn speeds(&self, angle_index: usize) -> &[f64] {
        self.per_angle.get(angle_index).map_or(&[][..], Vec::as_slice)
    }

    /// Records in the period
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Hours of the period including those without wind data, the
    /// exceedance divisor
    #[inline]
    pub fn divisor(&self) -> usize {
        self.sample_count + self.missing
    }

    /// Hours in direction `angle_index` whose local speed `ratio × speed`
    /// strictly exceeds `threshold`
    #[inline]
    pub fn count_exceeding(&self, angle_index: usize, ratio: f64, threshold: f64) -> usize {
        let speeds = self.speeds(angle_index);
        // Sorted, so `ratio * s <= threshold` holds for a prefix
        speeds.len() - speeds.partition_point(|&s| ratio * s <= threshold)
    }
}

/// Hourly wind climate (typical meteorological year)
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalClimate {
    period: ClimatePeriod,
    reference_speed: MetersPerSecond,
    comfort: Arc<EmpiricalSlice>,
    safety: Arc<EmpiricalSlice>,
}

impl EmpiricalClimate {
    /// Combine a period slice with the annual slice used for safety
    pub fn new(
        period: ClimatePeriod,
        reference_speed: MetersPerSecond,
        comfort: Arc<EmpiricalSlice>,
        safety: Arc<EmpiricalSlice>,
    ) -> Self {
        Self {
            period,
            reference_speed,
            comfort,
            safety,
        }
    }

    /// Slice a threshold group is evaluated against
    #[inline]
    pub fn slice(&self, group: ThresholdGroup) -> &EmpiricalSlice {
        match group {
            ThresholdGroup::Comfort => &self.comfort,
            ThresholdGroup::Safety => &self.safety,
        }
    }
}

/// Weibull wind climate
#[derive(Debug, Clone, PartialEq)]
pub struct ParametricClimate {
    period: ClimatePeriod,
    reference_speed: MetersPerSecond,
    /// Indexed by angle; `None` where the table has no row for the direction
    comfort: Vec<Option<DirectionalWeibull>>,
    safety: Vec<Option<DirectionalWeibull>>,
}

impl ParametricClimate {
    /// Align a period table and the annual table with the run's angles
    ///
    /// # Errors
    /// Returns `InputError::InvalidDistribution` if a row has a non-positive
    /// shape or scale.
    pub fn new(
        comfort: &WeibullTable,
        annual: &WeibullTable,
        angles: &AngleSet,
        reference_speed: MetersPerSecond,
    ) -> Result<Self, InputError> {
        Ok(Self {
            period: comfort.period(),
            reference_speed,
            comfort: align(comfort, angles)?,
            safety: align(annual, angles)?,
        })
    }

    /// Distribution of a direction for a threshold group
    #[inline]
    pub fn distribution(
        &self,
        group: ThresholdGroup,
        angle_index: usize,
    ) -> Option<&DirectionalWeibull> {
        let rows = match group {
            ThresholdGroup::Comfort => &self.comfort,
            ThresholdGroup::Safety => &self.safety,
        };
        rows.get(angle_index).and_then(Option::as_ref)
    }
}

fn align(
    table: &WeibullTable,
    angles: &AngleSet,
) -> Result<Vec<Option<DirectionalWeibull>>, InputError> {
    for row in table.rows() {
        if !row.params.is_valid() {
            return Err(InputError::InvalidDistribution {
                period: table.period().label().to_string(),
                direction: *row.direction,
                msg: "shape and scale must be positive".to_string(),
            });
        }
        if angles.index_of(row.direction).is_none() {
            warn!(
                period = %table.period(),
                direction = %row.direction,
                "Weibull row has no matching wind angle and is ignored"
            );
        }
    }
    Ok(angles.iter().map(|a| table.row_for(a).copied()).collect())
}

/// Wind statistics of one pass
#[derive(Debug, Clone, PartialEq)]
pub enum WindClimateSource {
    /// Count exceedances in hourly records
    Empirical(EmpiricalClimate),
    /// Integrate fitted Weibull distributions
    Parametric(ParametricClimate),
}

impl WindClimateSource {
    /// Period the comfort statistics describe
    pub fn period(&self) -> ClimatePeriod {
        match self {
            WindClimateSource::Empirical(c) => c.period,
            WindClimateSource::Parametric(c) => c.period,
        }
    }

    /// Reference wind speed the velocity ratios are relative to
    pub fn reference_speed(&self) -> MetersPerSecond {
        match self {
            WindClimateSource::Empirical(c) => c.reference_speed,
            WindClimateSource::Parametric(c) => c.reference_speed,
        }
    }

    /// Comfort-period speeds of a direction bucket (empty for Weibull climates)
    pub fn per_direction_series(&self, angle_index: usize) -> &[f64] {
        match self {
            WindClimateSource::Empirical(c) => c.comfort.speeds(angle_index),
            WindClimateSource::Parametric(_) => &[],
        }
    }

    /// Comfort-period distribution of a direction (`None` for hourly climates)
    pub fn per_direction_distribution(&self, angle_index: usize) -> Option<&DirectionalWeibull> {
        match self {
            WindClimateSource::Empirical(_) => None,
            WindClimateSource::Parametric(c) => {
                c.distribution(ThresholdGroup::Comfort, angle_index)
            }
        }
    }

    /// Number of direction slots
    pub fn angle_count(&self) -> usize {
        match self {
            WindClimateSource::Empirical(c) => c.comfort.per_angle.len(),
            WindClimateSource::Parametric(c) => c.comfort.len(),
        }
    }

    /// True if the comfort statistics hold no data, so every exceedance is zero
    pub fn is_empty(&self) -> bool {
        match self {
            WindClimateSource::Empirical(c) => c.comfort.sample_count() == 0,
            WindClimateSource::Parametric(c) => c.comfort.iter().all(Option::is_none),
        }
    }
}

/// Climate of one pass, or the reason it could not be built
#[derive(Debug)]
pub struct ClimatePass {
    /// Period of the pass
    pub period: ClimatePeriod,
    /// Statistics, or the input error that loses this pass
    pub source: Result<WindClimateSource, InputError>,
}

/// Hourly passes: annual, then the four seasons if requested
///
/// The reference speed defaults to the mean speed of the series.
pub fn empirical_passes(
    series: &WindSeries,
    angles: &AngleSet,
    seasonal: bool,
    reference_speed: Option<MetersPerSecond>,
) -> Vec<ClimatePass> {
    let reference_speed = reference_speed
        .or_else(|| series.mean_speed())
        .unwrap_or_default();

    let annual = Arc::new(EmpiricalSlice::from_series(series, angles, ClimatePeriod::Annual));
    if annual.divisor() != HOURS_PER_YEAR {
        warn!(
            hours = annual.divisor(),
            expected = HOURS_PER_YEAR,
            "Annual weather slice is not a full year; exceedance is relative to the hours present"
        );
    }

    ClimatePeriod::ALL
        .into_iter()
        .filter(|p| seasonal || *p == ClimatePeriod::Annual)
        .map(|period| {
            let comfort = if period == ClimatePeriod::Annual {
                Arc::clone(&annual)
            } else {
                Arc::new(EmpiricalSlice::from_series(series, angles, period))
            };
            debug!(period = %period, hours = comfort.sample_count(), "Built hourly climate slice");
            ClimatePass {
                period,
                source: Ok(WindClimateSource::Empirical(EmpiricalClimate::new(
                    period,
                    reference_speed,
                    comfort,
                    Arc::clone(&annual),
                ))),
            }
        })
        .collect()
}

/// Weibull passes, one per table, annual first
///
/// # Errors
/// Every pass evaluates the safety threshold against the annual table, so a
/// failed annual table returns its error and a missing one returns
/// `InputError::FitFailed`.
pub fn parametric_passes(
    tables: Vec<(ClimatePeriod, Result<WeibullTable, InputError>)>,
    angles: &AngleSet,
    reference_speed: MetersPerSecond,
) -> Result<Vec<ClimatePass>, InputError> {
    let annual = match tables.iter().find(|(p, _)| *p == ClimatePeriod::Annual) {
        Some((_, Ok(table))) => table.clone(),
        Some((_, Err(e))) => return Err(e.clone()),
        None => {
            return Err(InputError::FitFailed {
                period: ClimatePeriod::Annual.label().to_string(),
                direction: 0.0,
                samples: 0,
                reason: "no annual Weibull table".to_string(),
            })
        }
    };

    let mut tables = tables;
    tables.sort_by_key(|(p, _)| *p);

    Ok(tables
        .into_iter()
        .map(|(period, table)| ClimatePass {
            period,
            source: table
                .and_then(|t| ParametricClimate::new(&t, &annual, angles, reference_speed))
                .map(WindClimateSource::Parametric),
        })
        .collect())
}
