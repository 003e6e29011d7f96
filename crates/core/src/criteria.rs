//! Lawson comfort criteria
//!
//! A criterion is a set of wind-speed thresholds, each paired with the maximum
//! fraction of time it may be exceeded. Thresholds come in two groups:
//!
//! - **Comfort**: ascending speeds separating the activity classes
//!   (sitting, standing, strolling, business walking)
//! - **Safety**: a single higher speed, evaluated against the annual climate
//!
//! # Lawson LDDC
//!
//! | Group   | Speed (m/s) | Max exceedance |
//! |---------|-------------|----------------|
//! | Comfort | 2.5         | 5%             |
//! | Comfort | 4           | 5%             |
//! | Comfort | 6           | 5%             |
//! | Comfort | 8           | 5%             |
//! | Safety  | 15          | 0.022%         |
//!
//! Internally every per-threshold vector is in ascending threshold order, so
//! index 0 is the lowest (most often exceeded) threshold.

use crate::core_types::MetersPerSecond;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which statistics set a threshold is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdGroup {
    /// Evaluated against the pass's own (possibly seasonal) climate
    Comfort,
    /// Evaluated against the annual climate
    Safety,
}

/// A wind speed threshold with its exceedance budget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Wind speed that should rarely be exceeded
    pub speed: MetersPerSecond,
    /// Maximum tolerable exceedance frequency (0-1)
    pub max_frequency: f64,
    /// Statistics group
    pub group: ThresholdGroup,
}

/// Validated comfort and safety thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ThresholdSpec", into = "ThresholdSpec")]
pub struct ThresholdSet {
    /// All thresholds, ascending by speed
    thresholds: Vec<Threshold>,
}

impl ThresholdSet {
    /// Build a threshold set from `(speed, max_frequency)` pairs
    ///
    /// # Errors
    /// Returns a `ConfigError` if a speed is not positive, comfort speeds are
    /// not strictly ascending, the safety speed is not above every comfort
    /// speed, a budget lies outside `[0, 1]`, or budgets increase with speed.
    pub fn new(comfort: &[(f64, f64)], safety: (f64, f64)) -> Result<Self, ConfigError> {
        if comfort.is_empty() {
            return Err(ConfigError::UnorderedThresholds(
                "at least one comfort threshold is required".to_string(),
            ));
        }

        let thresholds: Vec<Threshold> = comfort
            .iter()
            .map(|&(speed, max_frequency)| Threshold {
                speed: MetersPerSecond::new(speed),
                max_frequency,
                group: ThresholdGroup::Comfort,
            })
            .chain(std::iter::once(Threshold {
                speed: MetersPerSecond::new(safety.0),
                max_frequency: safety.1,
                group: ThresholdGroup::Safety,
            }))
            .collect();

        for t in &thresholds {
            if !t.speed.is_positive() {
                return Err(ConfigError::NonPositiveThreshold { speed: *t.speed });
            }
            if !(0.0..=1.0).contains(&t.max_frequency) {
                return Err(ConfigError::InvalidBudget {
                    speed: *t.speed,
                    budget: t.max_frequency,
                });
            }
        }

        for pair in thresholds.windows(2) {
            let (lower, higher) = (pair[0], pair[1]);
            if higher.speed <= lower.speed {
                return Err(ConfigError::UnorderedThresholds(format!(
                    "{} must be above {}",
                    higher.speed, lower.speed
                )));
            }
            if higher.max_frequency > lower.max_frequency {
                return Err(ConfigError::NonMonotonicBudget {
                    lower: *lower.speed,
                    higher: *higher.speed,
                });
            }
        }

        Ok(Self { thresholds })
    }

    /// Build from parallel speed and budget lists for each group
    ///
    /// # Errors
    /// Returns `ConfigError::LengthMismatch` when the lists differ in length
    /// and any error from [`ThresholdSet::new`].
    pub fn from_groups(
        comfort_speeds: &[f64],
        comfort_budgets: &[f64],
        safety_speed: f64,
        safety_budget: f64,
    ) -> Result<Self, ConfigError> {
        if comfort_speeds.len() != comfort_budgets.len() {
            return Err(ConfigError::LengthMismatch {
                thresholds: comfort_speeds.len(),
                budgets: comfort_budgets.len(),
            });
        }
        let comfort: Vec<(f64, f64)> = comfort_speeds
            .iter()
            .copied()
            .zip(comfort_budgets.iter().copied())
            .collect();
        Self::new(&comfort, (safety_speed, safety_budget))
    }

    /// Lawson LDDC criterion
    #[must_use]
    pub fn lawson_lddc() -> Self {
        Self {
            thresholds: vec![
                Threshold {
                    speed: MetersPerSecond::new(2.5),
                    max_frequency: 0.05,
                    group: ThresholdGroup::Comfort,
                },
                Threshold {
                    speed: MetersPerSecond::new(4.0),
                    max_frequency: 0.05,
                    group: ThresholdGroup::Comfort,
                },
                Threshold {
                    speed: MetersPerSecond::new(6.0),
                    max_frequency: 0.05,
                    group: ThresholdGroup::Comfort,
                },
                Threshold {
                    speed: MetersPerSecond::new(8.0),
                    max_frequency: 0.05,
                    group: ThresholdGroup::Comfort,
                },
                Threshold {
                    speed: MetersPerSecond::new(15.0),
                    max_frequency: 0.00022,
                    group: ThresholdGroup::Safety,
                },
            ],
        }
    }

    /// Total number of thresholds (comfort + safety)
    #[inline]
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// Always false for a validated set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Number of comfort thresholds
    pub fn comfort_len(&self) -> usize {
        self.comfort().len()
    }

    /// Thresholds in ascending speed order
    #[inline]
    pub fn thresholds(&self) -> &[Threshold] {
        &self.thresholds
    }

    /// Comfort thresholds, ascending
    #[inline]
    pub fn comfort(&self) -> &[Threshold] {
        &self.thresholds[..self.thresholds.len() - 1]
    }

    /// The safety threshold, always last in a validated set
    #[inline]
    pub fn safety(&self) -> Threshold {
        self.thresholds[self.thresholds.len() - 1]
    }

    /// Threshold speeds, ascending
    pub fn speeds_ascending(&self) -> Vec<f64> {
        self.thresholds.iter().map(|t| *t.speed).collect()
    }

    /// Threshold speeds, descending (`thresh_ws_values`)
    pub fn thresh_ws_values(&self) -> Vec<f64> {
        self.thresholds.iter().rev().map(|t| *t.speed).collect()
    }

    /// Frequency budgets aligned with [`ThresholdSet::speeds_ascending`]
    pub fn budgets(&self) -> Vec<f64> {
        self.thresholds.iter().map(|t| t.max_frequency).collect()
    }
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self::lawson_lddc()
    }
}

/// Serialized form of a threshold set, validated on deserialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSpec {
    /// Comfort thresholds (m/s), ascending
    pub comfort: Vec<f64>,
    /// Comfort exceedance budgets, one per comfort threshold
    pub comfort_frequency: Vec<f64>,
    /// Safety threshold (m/s)
    pub safety: f64,
    /// Safety exceedance budget
    pub safety_frequency: f64,
}

impl TryFrom<ThresholdSpec> for ThresholdSet {
    type Error = ConfigError;

    fn try_from(spec: ThresholdSpec) -> Result<Self, Self::Error> {
        ThresholdSet::from_groups(
            &spec.comfort,
            &spec.comfort_frequency,
            spec.safety,
            spec.safety_frequency,
        )
    }
}

impl From<ThresholdSet> for ThresholdSpec {
    fn from(set: ThresholdSet) -> Self {
        let safety = set.safety();
        Self {
            comfort: set.comfort().iter().map(|t| *t.speed).collect(),
            comfort_frequency: set.comfort().iter().map(|t| t.max_frequency).collect(),
            safety: *safety.speed,
            safety_frequency: safety.max_frequency,
        }
    }
}

/// How exceedance frequencies are obtained from the wind climate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComfortMethod {
    /// Count exceedances in a typical meteorological year (EPW file)
    Epw,
    /// Integrate fitted Weibull distributions per direction
    Weibull,
}

impl ComfortMethod {
    /// Label used in output file names
    pub const fn label(self) -> &'static str {
        match self {
            ComfortMethod::Epw => "epw",
            ComfortMethod::Weibull => "weibull",
        }
    }
}

impl FromStr for ComfortMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "epw" => Ok(ComfortMethod::Epw),
            "weibull" => Ok(ComfortMethod::Weibull),
            other => Err(ConfigError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for ComfortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lddc_views() {
        let lddc = ThresholdSet::lawson_lddc();
        assert_eq!(lddc.len(), 5);
        assert_eq!(lddc.comfort_len(), 4);
        assert_eq!(lddc.thresh_ws_values(), vec![15.0, 8.0, 6.0, 4.0, 2.5]);
        assert_eq!(lddc.speeds_ascending(), vec![2.5, 4.0, 6.0, 8.0, 15.0]);
        assert_eq!(lddc.budgets(), vec![0.05, 0.05, 0.05, 0.05, 0.00022]);
        assert_eq!(lddc.thresholds()[4].group, ThresholdGroup::Safety);
    }

    #[test]
    fn test_lddc_matches_validated_construction() {
        let built = ThresholdSet::from_groups(
            &[2.5, 4.0, 6.0, 8.0],
            &[0.05, 0.05, 0.05, 0.05],
            15.0,
            0.00022,
        )
        .unwrap();
        assert_eq!(built, ThresholdSet::lawson_lddc());
    }

    #[test]
    fn test_non_positive_threshold_rejected() {
        let err = ThresholdSet::new(&[(0.0, 0.05), (4.0, 0.05)], (15.0, 0.001)).unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveThreshold { speed: 0.0 });

        let err = ThresholdSet::new(&[(2.5, 0.05)], (-1.0, 0.001)).unwrap_err();
        assert!(matches!(err, ConfigError::NonPositiveThreshold { .. }));
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        assert!(matches!(
            ThresholdSet::new(&[(4.0, 0.05), (2.5, 0.05)], (15.0, 0.001)),
            Err(ConfigError::UnorderedThresholds(_))
        ));
        // Safety must sit above all comfort thresholds
        assert!(matches!(
            ThresholdSet::new(&[(2.5, 0.05), (8.0, 0.05)], (6.0, 0.001)),
            Err(ConfigError::UnorderedThresholds(_))
        ));
    }

    #[test]
    fn test_non_monotonic_budget_rejected() {
        let err = ThresholdSet::new(&[(2.5, 0.02), (4.0, 0.05)], (15.0, 0.001)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::NonMonotonicBudget {
                lower: 2.5,
                higher: 4.0
            }
        );
        assert!(matches!(
            ThresholdSet::new(&[(2.5, 0.05)], (15.0, 1.5)),
            Err(ConfigError::InvalidBudget { .. })
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = ThresholdSet::from_groups(&[2.5, 4.0], &[0.05], 15.0, 0.001).unwrap_err();
        assert_eq!(
            err,
            ConfigError::LengthMismatch {
                thresholds: 2,
                budgets: 1
            }
        );
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = serde_json::to_string(&ThresholdSet::lawson_lddc()).unwrap();
        let back: ThresholdSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ThresholdSet::lawson_lddc());

        let bad = r#"{"comfort":[4.0,2.5],"comfort_frequency":[0.05,0.05],"safety":15.0,"safety_frequency":0.001}"#;
        assert!(serde_json::from_str::<ThresholdSet>(bad).is_err());
    }

    #[test]
    fn test_custom_safety_serialized() {
        let set = ThresholdSet::new(&[(3.0, 0.1), (5.0, 0.02)], (20.0, 0.001)).unwrap();
        assert_eq!(set.safety().speed, MetersPerSecond::new(20.0));
        assert_eq!(set.comfort().len(), 2);

        let spec = ThresholdSpec::from(set.clone());
        assert_eq!(spec.comfort, vec![3.0, 5.0]);
        assert_eq!(spec.comfort_frequency, vec![0.1, 0.02]);
        assert_eq!((spec.safety, spec.safety_frequency), (20.0, 0.001));

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(serde_json::from_str::<ThresholdSet>(&json).unwrap(), set);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("epw".parse::<ComfortMethod>().unwrap(), ComfortMethod::Epw);
        assert_eq!(" Weibull ".parse::<ComfortMethod>().unwrap(), ComfortMethod::Weibull);
        assert_eq!(
            "gumbel".parse::<ComfortMethod>().unwrap_err(),
            ConfigError::UnknownMethod("gumbel".to_string())
        );
    }
}
