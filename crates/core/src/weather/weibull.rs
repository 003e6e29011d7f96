//! Two-parameter Weibull wind climate
//!
//! Wind speeds of each direction bucket are fitted with a Weibull distribution
//! by maximum likelihood. The probability of exceeding speed `v` is
//!
//! ```text
//! P(V > v) = exp(-(v / c)^k)
//! ```
//!
//! where `c` is the scale (m/s) and `k` the shape. A table holds one row per
//! direction together with the probability of that direction, and is stored
//! as `weibull_<period>.csv` with columns `Direction,p,c,k`.
//!
//! # References
//! - Cohen, A.C. (1965). "Maximum likelihood estimation in the Weibull
//!   distribution based on complete and on censored samples."
//!   Technometrics, 7(4), 579-588.

use super::season::ClimatePeriod;
use super::series::{DirectionalSamples, WindSeries};
use crate::core_types::{AngleSet, Degrees, MetersPerSecond};
use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Fewest samples a direction bucket needs for a fit
pub const MIN_FIT_SAMPLES: usize = 2;

const MAX_NEWTON_ITERATIONS: usize = 100;
const SHAPE_TOLERANCE: f64 = 1e-10;

/// Weibull shape and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullParams {
    /// Shape `k` (dimensionless)
    pub shape: f64,
    /// Scale `c`
    pub scale: MetersPerSecond,
}

/// Why a Weibull fit could not be produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitError {
    /// Fewer than [`MIN_FIT_SAMPLES`] samples
    TooFewSamples(usize),
    /// A sample is zero, negative or not finite
    NonPositiveSample(f64),
    /// All samples are equal
    ZeroVariance,
    /// Newton iteration on the shape did not converge
    NotConverged,
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::TooFewSamples(n) => {
                write!(f, "{n} samples, at least {MIN_FIT_SAMPLES} required")
            }
            FitError::NonPositiveSample(v) => write!(f, "sample {v} is not positive"),
            FitError::ZeroVariance => f.write_str("all samples are equal"),
            FitError::NotConverged => f.write_str("shape estimate did not converge"),
        }
    }
}

impl std::error::Error for FitError {}

impl WeibullParams {
    /// Create parameters without validation
    pub const fn new(shape: f64, scale: MetersPerSecond) -> Self {
        Self { shape, scale }
    }

    /// True if both parameters are finite and positive
    pub fn is_valid(&self) -> bool {
        self.shape.is_finite() && self.shape > 0.0 && self.scale.is_positive()
    }

    /// Probability that the wind speed exceeds `speed`
    pub fn survival(&self, speed: f64) -> f64 {
        (-(speed / *self.scale).powf(self.shape)).exp()
    }

    /// Maximum likelihood fit
    ///
    /// Samples are normalised by their maximum before iterating so that
    /// `x^k` stays bounded for large shapes. The shape solves
    ///
    /// ```text
    /// Σ y^k ln y / Σ y^k - 1/k - mean(ln y) = 0
    /// ```
    ///
    /// by Newton's method, started from the moment estimate
    /// `π / (√6 · std(ln y))`.
    ///
    /// # Errors
    /// Returns a [`FitError`] for too few samples, non-positive samples,
    /// zero variance or a shape iteration that does not converge.
    pub fn fit(samples: &[f64]) -> Result<Self, FitError> {
        if samples.len() < MIN_FIT_SAMPLES {
            return Err(FitError::TooFewSamples(samples.len()));
        }
        if let Some(&bad) = samples.iter().find(|v| !v.is_finite() || **v <= 0.0) {
            return Err(FitError::NonPositiveSample(bad));
        }

        let n = samples.len() as f64;
        let x_max = samples.iter().copied().fold(f64::MIN, f64::max);
        let ln_y: Vec<f64> = samples.iter().map(|x| (x / x_max).ln()).collect();
        let mean_ln = ln_y.iter().sum::<f64>() / n;
        let var_ln = ln_y.iter().map(|l| (l - mean_ln).powi(2)).sum::<f64>() / n;
        if var_ln <= f64::EPSILON * f64::EPSILON {
            return Err(FitError::ZeroVariance);
        }

        let mut k = std::f64::consts::PI / (6.0_f64.sqrt() * var_ln.sqrt());
        let mut converged = false;

        for _ in 0..MAX_NEWTON_ITERATIONS {
            let (mut s0, mut s1, mut s2) = (0.0, 0.0, 0.0);
            for &l in &ln_y {
                let yk = (k * l).exp();
                s0 += yk;
                s1 += yk * l;
                s2 += yk * l * l;
            }
            let g = s1 / s0 - 1.0 / k - mean_ln;
            let dg = (s2 * s0 - s1 * s1) / (s0 * s0) + 1.0 / (k * k);
            let step = g / dg;

            let mut next = k - step;
            if next <= 0.0 {
                next = k / 2.0;
            }
            if (next - k).abs() <= SHAPE_TOLERANCE * k {
                k = next;
                converged = true;
                break;
            }
            k = next;
        }

        if !converged || !k.is_finite() {
            return Err(FitError::NotConverged);
        }

        let mean_yk = ln_y.iter().map(|l| (k * l).exp()).sum::<f64>() / n;
        let scale = x_max * mean_yk.powf(1.0 / k);
        Ok(Self::new(k, MetersPerSecond::new(scale)))
    }
}

/// Weibull parameters of one direction bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalWeibull {
    /// Bucket centre
    pub direction: Degrees,
    /// Fraction of the period's records in this bucket
    pub probability: f64,
    /// Fitted distribution of the bucket's wind speeds
    pub params: WeibullParams,
}

impl DirectionalWeibull {
    /// Contribution of this direction to the probability of exceeding
    /// `threshold` at a point with velocity ratio `ratio`
    ///
    /// The local distribution keeps the shape and scales `c` by the ratio. A
    /// zero ratio means the point is sheltered and contributes nothing.
    pub fn exceedance(&self, threshold: f64, ratio: f64) -> f64 {
        if ratio <= 0.0 {
            return 0.0;
        }
        let local = WeibullParams::new(self.params.shape, self.params.scale * ratio);
        self.probability * local.survival(threshold)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WeibullRow {
    #[serde(rename = "Direction")]
    direction: f64,
    p: f64,
    c: f64,
    k: f64,
}

/// Per-direction Weibull parameters of one climate period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeibullTable {
    period: ClimatePeriod,
    rows: Vec<DirectionalWeibull>,
}

impl WeibullTable {
    /// Validate a table
    ///
    /// # Errors
    /// Returns `InputError::InvalidDistribution` if a shape or scale is not
    /// positive, or a direction probability lies outside `[0, 1]`.
    pub fn new(period: ClimatePeriod, rows: Vec<DirectionalWeibull>) -> Result<Self, InputError> {
        for row in &rows {
            let invalid = |msg: String| InputError::InvalidDistribution {
                period: period.label().to_string(),
                direction: *row.direction,
                msg,
            };
            if !row.params.is_valid() {
                return Err(invalid(format!(
                    "shape {} and scale {} must be positive",
                    row.params.shape, *row.params.scale
                )));
            }
            if !(0.0..=1.0).contains(&row.probability) {
                return Err(invalid(format!(
                    "direction probability {} is outside [0, 1]",
                    row.probability
                )));
            }
        }
        Ok(Self { period, rows })
    }

    /// Fit every non-empty direction bucket of a period
    ///
    /// Empty buckets get no row; the direction never occurs in the period.
    ///
    /// # Errors
    /// Returns `InputError::FitFailed` for the first bucket that cannot be fitted.
    pub fn fit(samples: &DirectionalSamples, angles: &AngleSet) -> Result<Self, InputError> {
        let period = samples.period;
        let mut rows = Vec::with_capacity(angles.len());

        for (angle, speeds) in angles.iter().zip(&samples.per_angle) {
            if speeds.is_empty() {
                debug!(period = %period, direction = %angle, "No records in direction bucket");
                continue;
            }
            let params = WeibullParams::fit(speeds).map_err(|e| InputError::FitFailed {
                period: period.label().to_string(),
                direction: *angle,
                samples: speeds.len(),
                reason: e.to_string(),
            })?;
            rows.push(DirectionalWeibull {
                direction: angle,
                probability: speeds.len() as f64 / samples.total as f64,
                params,
            });
        }

        Self::new(period, rows)
    }

    /// Period the table describes
    #[inline]
    pub fn period(&self) -> ClimatePeriod {
        self.period
    }

    /// Rows in file order
    #[inline]
    pub fn rows(&self) -> &[DirectionalWeibull] {
        &self.rows
    }

    /// Row for a direction, matched within 1e-6 degrees
    pub fn row_for(&self, direction: Degrees) -> Option<&DirectionalWeibull> {
        self.rows
            .iter()
            .find(|r| (*r.direction - *direction).abs() < 1e-6)
    }

    /// File name of a period's table (`weibull_annual.csv`, ...)
    pub fn file_name(period: ClimatePeriod) -> String {
        format!("weibull_{}.csv", period.label())
    }

    /// Write the table into `dir`, returning the file path
    ///
    /// # Errors
    /// Returns an `InputError` if the file cannot be written.
    pub fn write_csv(&self, dir: &Path) -> Result<PathBuf, InputError> {
        let path = dir.join(Self::file_name(self.period));
        let mut writer = csv::Writer::from_path(&path).map_err(|e| InputError::csv(&path, &e))?;
        for row in &self.rows {
            writer
                .serialize(WeibullRow {
                    direction: *row.direction,
                    p: row.probability,
                    c: *row.params.scale,
                    k: row.params.shape,
                })
                .map_err(|e| InputError::csv(&path, &e))?;
        }
        writer.flush().map_err(|e| InputError::io(&path, &e))?;
        Ok(path)
    }

    /// Read a table written by [`WeibullTable::write_csv`]
    ///
    /// # Errors
    /// Returns `InputError::MissingFile`, `InputError::Csv` for malformed
    /// rows, `InputError::EmptyFile` for a table without rows, and
    /// `InputError::InvalidDistribution` for invalid parameters.
    pub fn read_csv(path: &Path, period: ClimatePeriod) -> Result<Self, InputError> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| InputError::csv(path, &e))?;
        let mut rows = Vec::new();
        for row in reader.deserialize::<WeibullRow>() {
            let row = row.map_err(|e| InputError::csv(path, &e))?;
            rows.push(DirectionalWeibull {
                direction: Degrees::new(row.direction),
                probability: row.p,
                params: WeibullParams::new(row.k, MetersPerSecond::new(row.c)),
            });
        }
        if rows.is_empty() {
            return Err(InputError::EmptyFile(path.to_path_buf()));
        }
        Self::new(period, rows)
    }
}

/// Fit the annual table and, if requested, one table per season
///
/// Each period succeeds or fails on its own, so a sparse season does not
/// prevent the others from being produced.
pub fn fit_tables(
    series: &WindSeries,
    angles: &AngleSet,
    seasonal: bool,
) -> Vec<(ClimatePeriod, Result<WeibullTable, InputError>)> {
    ClimatePeriod::ALL
        .into_iter()
        .filter(|p| seasonal || *p == ClimatePeriod::Annual)
        .map(|period| {
            let samples = series.bin(angles, period);
            let table = WeibullTable::fit(&samples, angles);
            match &table {
                Ok(t) => info!(period = %period, directions = t.rows().len(), "Fitted Weibull table"),
                Err(e) => warn!(period = %period, error = %e, "Weibull fit failed"),
            }
            (period, table)
        })
        .collect()
}

/// Load every `weibull_<period>.csv` table in `dir`, annual first
///
/// Files whose suffix is not a known period are ignored.
///
/// # Errors
/// Returns an `InputError` if the directory cannot be read or the annual
/// table, which the safety threshold is evaluated against, is missing.
pub fn load_tables(
    dir: &Path,
) -> Result<Vec<(ClimatePeriod, Result<WeibullTable, InputError>)>, InputError> {
    let entries = fs::read_dir(dir).map_err(|e| InputError::io(dir, &e))?;

    let mut found: Vec<(ClimatePeriod, PathBuf)> = Vec::new();
    for path in entries.filter_map(Result::ok).map(|e| e.path()) {
        let Some(label) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("weibull_"))
            .and_then(|n| n.strip_suffix(".csv"))
        else {
            continue;
        };
        match label.parse::<ClimatePeriod>() {
            Ok(period) => found.push((period, path)),
            Err(e) => warn!(path = %path.display(), "Ignoring Weibull table: {e}"),
        }
    }
    found.sort_by_key(|(period, _)| *period);

    if !found.iter().any(|(p, _)| *p == ClimatePeriod::Annual) {
        return Err(InputError::MissingFile(
            dir.join(WeibullTable::file_name(ClimatePeriod::Annual)),
        ));
    }

    info!(dir = %dir.display(), tables = found.len(), "Found Weibull tables");
    Ok(found
        .into_iter()
        .map(|(period, path)| (period, WeibullTable::read_csv(&path, period)))
        .collect())
}
