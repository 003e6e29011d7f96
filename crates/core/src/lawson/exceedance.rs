//! Exceedance frequencies of the threshold speeds at one point

use crate::criteria::{Threshold, ThresholdGroup, ThresholdSet};
use crate::weather::WindClimateSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Probability of exceeding each threshold, ascending threshold order
///
/// Values lie in `[0, 1]`. Within a threshold group they never increase with
/// the index: a higher speed cannot be exceeded more often than a lower one
/// under the same statistics. The safety entry comes from the annual climate
/// and may exceed the comfort entries of a calm season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceedanceVector(Vec<f64>);

impl ExceedanceVector {
    /// Clamp raw frequencies to `[0, 1]` and enforce the ordering with a
    /// running minimum that restarts at every group boundary
    pub fn from_raw(raw: impl IntoIterator<Item = (ThresholdGroup, f64)>) -> Self {
        let mut group = None;
        let mut running = 1.0_f64;
        let values = raw
            .into_iter()
            .map(|(g, v)| {
                if group != Some(g) {
                    group = Some(g);
                    running = 1.0;
                }
                let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
                running = running.min(v);
                running
            })
            .collect();
        Self(values)
    }

    /// All-zero vector
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Frequencies, ascending threshold order
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Number of thresholds
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no thresholds are covered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Frequencies as percentages
    pub fn percentages(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|v| v * 100.0)
    }
}

/// A point's velocity ratios cannot be classified
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatioError {
    /// The ratio vector does not match the run's angle count
    CountMismatch {
        /// Ratios supplied
        ratios: usize,
        /// Angles in the climate
        angles: usize,
    },
    /// Negative or non-finite ratio, typically a sample inside a solid
    Invalid {
        /// Angle index of the bad value
        angle_index: usize,
        /// Value read
        value: f64,
    },
}

impl fmt::Display for RatioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatioError::CountMismatch { ratios, angles } => {
                write!(f, "{ratios} velocity ratios for {angles} wind angles")
            }
            RatioError::Invalid { angle_index, value } => {
                write!(f, "invalid velocity ratio {value} at angle index {angle_index}")
            }
        }
    }
}

impl std::error::Error for RatioError {}

/// True for a usable velocity ratio: finite and not negative
#[inline]
pub fn is_valid_ratio(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Turns a point's velocity ratios into threshold exceedance frequencies
#[derive(Debug, Clone, PartialEq)]
pub struct ExceedanceCalculator {
    thresholds: Vec<Threshold>,
}

impl ExceedanceCalculator {
    /// Calculator for a validated threshold set
    pub fn new(thresholds: &ThresholdSet) -> Self {
        Self {
            thresholds: thresholds.thresholds().to_vec(),
        }
    }

    /// Number of thresholds, the length of every computed vector
    #[inline]
    pub fn threshold_count(&self) -> usize {
        self.thresholds.len()
    }

    /// Exceedance vector of one point
    ///
    /// - Hourly climate: local speeds `ratio × speed` strictly above the
    ///   threshold are counted over all directions and divided by the hours
    ///   of the slice, hours without wind data included.
    /// - Weibull climate: `p × exp(-(t / (c × ratio))^k)` summed over the
    ///   directions.
    ///
    /// Comfort thresholds use the pass's own statistics, the safety threshold
    /// the annual statistics.
    ///
    /// # Errors
    /// Returns [`RatioError::CountMismatch`] if `ratios` does not hold one
    /// value per angle of the climate and [`RatioError::Invalid`] for a
    /// negative or non-finite ratio.
    pub fn compute(
        &self,
        ratios: &[f64],
        climate: &WindClimateSource,
    ) -> Result<ExceedanceVector, RatioError> {
        if ratios.len() != climate.angle_count() {
            return Err(RatioError::CountMismatch {
                ratios: ratios.len(),
                angles: climate.angle_count(),
            });
        }
        if let Some(angle_index) = ratios.iter().position(|&r| !is_valid_ratio(r)) {
            return Err(RatioError::Invalid {
                angle_index,
                value: ratios[angle_index],
            });
        }

        let raw: Vec<(ThresholdGroup, f64)> = match climate {
            WindClimateSource::Empirical(c) => self
                .thresholds
                .iter()
                .map(|t| {
                    let slice = c.slice(t.group);
                    let divisor = slice.divisor();
                    if divisor == 0 {
                        return (t.group, 0.0);
                    }
                    let hits: usize = ratios
                        .iter()
                        .enumerate()
                        .map(|(a, &r)| slice.count_exceeding(a, r, *t.speed))
                        .sum();
                    (t.group, hits as f64 / divisor as f64)
                })
                .collect(),
            WindClimateSource::Parametric(c) => self
                .thresholds
                .iter()
                .map(|t| {
                    let p: f64 = ratios
                        .iter()
                        .enumerate()
                        .filter_map(|(a, &r)| {
                            c.distribution(t.group, a).map(|d| d.exceedance(*t.speed, r))
                        })
                        .sum();
                    (t.group, p)
                })
                .collect(),
        };

        Ok(ExceedanceVector::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{AngleSet, Degrees, MetersPerSecond};
    use crate::lawson::{ComfortClass, ComfortClassifier};
    use crate::weather::{
        empirical_passes, parametric_passes, ClimatePeriod, DirectionalWeibull, Season,
        WeibullParams, WeibullTable, WindRecord, WindSeries,
    };
    use approx::assert_relative_eq;

    const SUMMER: ClimatePeriod = ClimatePeriod::Season(Season::Summer);

    fn record(day: u32, speed: f64) -> WindRecord {
        WindRecord {
            day_of_year: day,
            speed: MetersPerSecond::new(speed),
            direction: Degrees::new(0.0),
        }
    }

    fn single_direction_table(period: ClimatePeriod, scale: f64) -> WeibullTable {
        WeibullTable::new(
            period,
            vec![DirectionalWeibull {
                direction: Degrees::new(0.0),
                probability: 1.0,
                params: WeibullParams::new(2.0, MetersPerSecond::new(scale)),
            }],
        )
        .unwrap()
    }

    fn uniform_two_angle_year() -> (AngleSet, WindClimateSource) {
        let angles = AngleSet::new(&[0.0, 180.0]).unwrap();
        let records = (0..8760)
            .map(|i| WindRecord {
                day_of_year: (i / 24) as u32 + 1,
                speed: MetersPerSecond::new(5.0),
                direction: Degrees::new(if i % 2 == 0 { 0.0 } else { 180.0 }),
            })
            .collect();
        let mut passes = empirical_passes(&WindSeries::new(records), &angles, false, None);
        let climate = passes.remove(0).source.unwrap();
        (angles, climate)
    }

    #[test]
    fn test_from_raw_clamps_and_orders_within_groups() {
        let v = ExceedanceVector::from_raw(
            [1.2, 0.3, 0.4, -0.1]
                .into_iter()
                .map(|p| (ThresholdGroup::Comfort, p))
                .chain([(ThresholdGroup::Safety, f64::NAN)]),
        );
        assert_eq!(v.values(), &[1.0, 0.3, 0.3, 0.0, 0.0]);

        // The safety entry is not capped by the comfort entries
        let v = ExceedanceVector::from_raw([
            (ThresholdGroup::Comfort, 0.0),
            (ThresholdGroup::Comfort, 0.0),
            (ThresholdGroup::Safety, 0.5),
        ]);
        assert_eq!(v.values(), &[0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_empirical_uniform_year() {
        let (_, climate) = uniform_two_angle_year();
        let calc = ExceedanceCalculator::new(&ThresholdSet::lawson_lddc());
        let exc = calc.compute(&[1.0, 1.0], &climate).unwrap();
        assert_eq!(exc.values(), &[1.0, 1.0, 0.0, 0.0, 0.0]);

        // Ratio 2 lifts the local speed to 10 m/s
        let exc = calc.compute(&[2.0, 0.0], &climate).unwrap();
        assert_relative_eq!(exc.values()[3], 0.5);
        assert_relative_eq!(exc.values()[4], 0.0);
    }

    #[test]
    fn test_weibull_single_direction() {
        let angles = AngleSet::new(&[0.0]).unwrap();
        let passes = parametric_passes(
            vec![(
                ClimatePeriod::Annual,
                Ok(single_direction_table(ClimatePeriod::Annual, 5.0)),
            )],
            &angles,
            MetersPerSecond::new(5.0),
        )
        .unwrap();
        let climate = passes[0].source.as_ref().unwrap();

        let thresholds = ThresholdSet::new(&[(5.0, 0.05)], (15.0, 0.00022)).unwrap();
        let exc = ExceedanceCalculator::new(&thresholds)
            .compute(&[1.0], climate)
            .unwrap();
        assert_relative_eq!(exc.values()[0], (-1.0_f64).exp(), epsilon = 1e-12);
        assert_relative_eq!(exc.values()[1], (-9.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_calm_season_keeps_annual_safety_hourly() {
        let angles = AngleSet::new(&[0.0]).unwrap();
        // Calm summer, stormy winter
        let records = (0..100)
            .map(|_| record(200, 1.0))
            .chain((0..100).map(|_| record(10, 20.0)))
            .collect();
        let passes = empirical_passes(&WindSeries::new(records), &angles, true, None);
        let summer = passes.iter().find(|p| p.period == SUMMER).unwrap();
        let climate = summer.source.as_ref().unwrap();

        let thresholds = ThresholdSet::lawson_lddc();
        let exc = ExceedanceCalculator::new(&thresholds)
            .compute(&[1.0], climate)
            .unwrap();
        assert_eq!(exc.values(), &[0.0, 0.0, 0.0, 0.0, 0.5]);

        let class = ComfortClassifier::new(&thresholds)
            .assign_class(exc.values())
            .unwrap();
        assert_eq!(class, ComfortClass(4));
    }

    #[test]
    fn test_calm_season_keeps_annual_safety_weibull() {
        let angles = AngleSet::new(&[0.0]).unwrap();
        let passes = parametric_passes(
            vec![
                (SUMMER, Ok(single_direction_table(SUMMER, 1.0))),
                (
                    ClimatePeriod::Annual,
                    Ok(single_direction_table(ClimatePeriod::Annual, 20.0)),
                ),
            ],
            &angles,
            MetersPerSecond::new(5.0),
        )
        .unwrap();
        assert_eq!(passes[1].period, SUMMER);
        let climate = passes[1].source.as_ref().unwrap();

        let thresholds = ThresholdSet::lawson_lddc();
        let exc = ExceedanceCalculator::new(&thresholds)
            .compute(&[1.0], climate)
            .unwrap();
        assert!(exc.values()[..4].iter().all(|&p| p < 0.05));
        assert_relative_eq!(exc.values()[4], (-0.5625_f64).exp(), epsilon = 1e-12);

        let class = ComfortClassifier::new(&thresholds)
            .assign_class(exc.values())
            .unwrap();
        assert_eq!(class, ComfortClass(4));
    }

    #[test]
    fn test_ratio_count_mismatch() {
        let (_, climate) = uniform_two_angle_year();
        let calc = ExceedanceCalculator::new(&ThresholdSet::lawson_lddc());
        assert_eq!(
            calc.compute(&[1.0], &climate),
            Err(RatioError::CountMismatch {
                ratios: 1,
                angles: 2
            })
        );
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let (_, climate) = uniform_two_angle_year();
        let calc = ExceedanceCalculator::new(&ThresholdSet::lawson_lddc());
        assert_eq!(
            calc.compute(&[-0.5, 1.0], &climate),
            Err(RatioError::Invalid {
                angle_index: 0,
                value: -0.5
            })
        );
        assert!(matches!(
            calc.compute(&[1.0, f64::NAN], &climate),
            Err(RatioError::Invalid { angle_index: 1, .. })
        ));
        assert!(calc.compute(&[1.0, f64::INFINITY], &climate).is_err());
        assert!(!is_valid_ratio(f64::NAN));
        assert!(is_valid_ratio(0.0));
    }
}
