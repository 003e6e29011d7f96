//! Lawson classification passes
//!
//! A run loads the velocity ratio field once, builds one climate per period
//! and then, for every period, classifies all points in parallel and writes
//! one CSV. Failures are contained at three levels:
//!
//! - Configuration errors abort the run before any point is processed
//! - Input errors lose the artifact they concern (a pass, or the whole field)
//! - Point errors are collected and the point is left out of the output

use super::classifier::{ClassLabels, ComfortClass, ComfortClassifier};
use super::exceedance::ExceedanceCalculator;
use super::output::{output_path, write_field_csv, write_receptor_csv, ClassifiedPoint};
use crate::core_types::{AngleSet, MetersPerSecond};
use crate::criteria::{ComfortMethod, ThresholdSet};
use crate::error::{ConfigError, InputError, LawsonError, PointError};
use crate::field::{FieldMode, VelocityRatioField, VelocityRatioSource};
use crate::weather::{
    empirical_passes, fit_tables, load_tables, parametric_passes, read_epw, read_history,
    ClimatePass, ClimatePeriod, HistoryColumns, WindClimateSource,
};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Where the wind climate comes from
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherInput {
    /// Typical meteorological year, counted hour by hour
    Epw(PathBuf),
    /// Station history, fitted with Weibull distributions before the run
    History {
        /// CSV export
        path: PathBuf,
        /// Column names
        columns: HistoryColumns,
    },
    /// Directory of previously written `weibull_<period>.csv` tables
    WeibullTables(PathBuf),
}

/// Validated settings of a classification run
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Simulated wind directions
    pub angles: AngleSet,
    /// Exceedance method
    pub method: ComfortMethod,
    /// Comfort and safety criteria
    pub thresholds: ThresholdSet,
    /// Velocity ratio inputs
    pub velocity_ratios: VelocityRatioSource,
    /// Directory the classified CSV files are written to
    pub output_dir: PathBuf,
    /// Leading part of every output file name
    pub output_stem: String,
    /// Wind climate input
    pub weather: WeatherInput,
    /// Also run the four seasonal passes
    pub seasonal: bool,
    /// Reference speed override; the mean weather speed otherwise
    pub reference_speed: Option<MetersPerSecond>,
}

impl EngineConfig {
    /// Check that the weather input suits the method
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidConfig` for an EPW method without an EPW
    /// file, or a Weibull method given an EPW file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.method, &self.weather) {
            (ComfortMethod::Epw, WeatherInput::Epw(_))
            | (
                ComfortMethod::Weibull,
                WeatherInput::History { .. } | WeatherInput::WeibullTables(_),
            ) => Ok(()),
            (method, weather) => Err(ConfigError::InvalidConfig(format!(
                "method '{method}' cannot use weather input {weather:?}"
            ))),
        }
    }
}

/// A written result file
#[derive(Debug, Clone, PartialEq)]
pub struct PassArtifact {
    /// Period of the pass
    pub period: ClimatePeriod,
    /// File written
    pub path: PathBuf,
    /// Points written
    pub points: usize,
    /// Number of points per class
    pub histogram: Vec<usize>,
}

/// A pass that produced no file
#[derive(Debug, Clone, PartialEq)]
pub struct FailedPass {
    /// Period of the pass
    pub period: ClimatePeriod,
    /// Why it failed
    pub error: InputError,
}

/// Summary of one `calculate` call
#[derive(Debug, Clone, PartialEq)]
pub struct WriteResult {
    /// Surface or receptor run
    pub mode: FieldMode,
    /// Files written, in pass order
    pub artifacts: Vec<PassArtifact>,
    /// Passes without output
    pub failed_passes: Vec<FailedPass>,
    /// Points left out, with the pass they were dropped from
    pub point_errors: Vec<(ClimatePeriod, PointError)>,
}

impl WriteResult {
    /// True if passes were attempted and none produced a file
    pub fn all_failed(&self) -> bool {
        self.artifacts.is_empty() && !self.failed_passes.is_empty()
    }
}

/// Runs the Lawson classification for one configuration
#[derive(Debug, Clone)]
pub struct LawsonEngine {
    config: EngineConfig,
    calculator: ExceedanceCalculator,
    classifier: ComfortClassifier,
    labels: ClassLabels,
}

impl LawsonEngine {
    /// Create an engine
    ///
    /// # Errors
    /// Returns a `ConfigError` if the weather input does not suit the method.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let calculator = ExceedanceCalculator::new(&config.thresholds);
        let classifier = ComfortClassifier::new(&config.thresholds);
        let labels = ClassLabels::new(classifier.class_count());
        Ok(Self {
            config,
            calculator,
            classifier,
            labels,
        })
    }

    /// Run configuration
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the climate of every pass from the configured weather input
    ///
    /// # Errors
    /// Returns an `InputError` if the weather file is missing or malformed,
    /// or if no annual Weibull table can be produced.
    pub fn climate_passes(&self) -> Result<Vec<ClimatePass>, InputError> {
        let cfg = &self.config;
        match &cfg.weather {
            WeatherInput::Epw(path) => {
                let series = read_epw(path)?;
                Ok(empirical_passes(
                    &series,
                    &cfg.angles,
                    cfg.seasonal,
                    cfg.reference_speed,
                ))
            }
            WeatherInput::History { path, columns } => {
                let series = read_history(path, columns)?;
                let reference = cfg
                    .reference_speed
                    .or_else(|| series.mean_speed())
                    .unwrap_or_default();
                let tables = fit_tables(&series, &cfg.angles, cfg.seasonal);
                parametric_passes(tables, &cfg.angles, reference)
            }
            WeatherInput::WeibullTables(dir) => {
                let reference = cfg.reference_speed.unwrap_or_else(|| {
                    warn!("No reference speed configured for Weibull tables");
                    MetersPerSecond::default()
                });
                parametric_passes(load_tables(dir)?, &cfg.angles, reference)
            }
        }
    }

    /// Classify every point of a field against one climate, in parallel
    ///
    /// Points with an invalid ratio, or a ratio count that does not fit the
    /// climate, are returned as errors and left out; the order of the
    /// classified points follows the field.
    ///
    /// # Errors
    /// Returns `ConfigError::ExceedanceTooShort` if the thresholds and
    /// budgets disagree in length.
    pub fn classify(
        &self,
        field: &VelocityRatioField,
        climate: &WindClimateSource,
    ) -> Result<(Vec<ClassifiedPoint>, Vec<PointError>), ConfigError> {
        if climate.is_empty() {
            warn!(
                period = %climate.period(),
                "Climate slice holds no wind data; every comfort exceedance is zero"
            );
        }

        let results: Vec<Result<ClassifiedPoint, PointError>> = (0..field.len())
            .into_par_iter()
            .map(|i| self.classify_point(field, climate, i))
            .collect::<Result<_, ConfigError>>()?;

        let mut points = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for r in results {
            match r {
                Ok(p) => points.push(p),
                Err(e) => errors.push(e),
            }
        }
        Ok((points, errors))
    }

    fn classify_point(
        &self,
        field: &VelocityRatioField,
        climate: &WindClimateSource,
        index: usize,
    ) -> Result<Result<ClassifiedPoint, PointError>, ConfigError> {
        let point = &field.points()[index];
        let exceedance = match self.calculator.compute(field.ratios(index), climate) {
            Ok(e) => e,
            Err(e) => {
                return Ok(Err(PointError {
                    index,
                    label: point.to_string(),
                    reason: e.to_string(),
                }))
            }
        };
        let class = self.classifier.assign_class(exceedance.values())?;
        Ok(Ok(ClassifiedPoint {
            point: point.clone(),
            class,
            exceedance,
        }))
    }

    /// Run every pass for the surface field or the receptors
    ///
    /// # Errors
    /// Returns `LawsonError::Input` if the velocity ratios or the weather
    /// cannot be loaded, and `LawsonError::Config` for inconsistent criteria.
    /// A pass that fails on its own is reported in the result instead.
    pub fn calculate(&self, receptors: bool) -> Result<WriteResult, LawsonError> {
        let cfg = &self.config;
        let mode = if receptors {
            FieldMode::Receptors
        } else {
            FieldMode::Surface
        };

        let field = VelocityRatioField::load(&cfg.velocity_ratios, &cfg.angles, mode)?;
        let passes = self.climate_passes()?;
        fs::create_dir_all(&cfg.output_dir).map_err(|e| InputError::io(&cfg.output_dir, &e))?;

        let mut result = WriteResult {
            mode,
            artifacts: Vec::new(),
            failed_passes: Vec::new(),
            point_errors: Vec::new(),
        };

        for pass in passes {
            let climate = match pass.source {
                Ok(climate) => climate,
                Err(e) => {
                    error!(period = %pass.period, error = %e, "Skipping pass");
                    result.failed_passes.push(FailedPass {
                        period: pass.period,
                        error: e,
                    });
                    continue;
                }
            };

            let (points, errors) = self.classify(&field, &climate)?;
            for e in &errors {
                warn!(period = %pass.period, "{e}");
            }
            result
                .point_errors
                .extend(errors.into_iter().map(|e| (pass.period, e)));

            let path = output_path(
                &cfg.output_dir,
                &cfg.output_stem,
                cfg.method,
                pass.period,
                mode,
            );
            match self.write(&path, mode, &points) {
                Ok(()) => {
                    let histogram = self.histogram(&points);
                    info!(
                        period = %pass.period,
                        path = %path.display(),
                        points = points.len(),
                        histogram = ?histogram,
                        "Wrote Lawson comfort classes"
                    );
                    result.artifacts.push(PassArtifact {
                        period: pass.period,
                        path,
                        points: points.len(),
                        histogram,
                    });
                }
                Err(e) => {
                    error!(period = %pass.period, error = %e, "Could not write pass");
                    result.failed_passes.push(FailedPass {
                        period: pass.period,
                        error: e,
                    });
                }
            }
        }

        Ok(result)
    }

    fn write(
        &self,
        path: &Path,
        mode: FieldMode,
        points: &[ClassifiedPoint],
    ) -> Result<(), InputError> {
        match mode {
            FieldMode::Surface => write_field_csv(path, points),
            FieldMode::Receptors => write_receptor_csv(path, points, &self.labels),
        }
    }

    fn histogram(&self, points: &[ClassifiedPoint]) -> Vec<usize> {
        let mut counts = vec![0; self.labels.len()];
        for ComfortClass(c) in points.iter().map(|p| p.class) {
            if let Some(slot) = counts.get_mut(c) {
                *slot += 1;
            }
        }
        counts
    }
}
