//! JSON run configuration
//!
//! ```json
//! {
//!   "case": "tower",
//!   "angles": { "start": 0.0, "end": 360.0, "count": 16 },
//!   "method": "epw",
//!   "vr_dir": "results/vr",
//!   "vr_stem": "VR",
//!   "lawson_output": "results/Lawson.csv",
//!   "weather": { "epw": "weather/london.epw" },
//!   "seasonal": true,
//!   "lawson_calculate": true,
//!   "lawson_receptors": true
//! }
//! ```
//!
//! `weather` is one of `{"epw": file}`, `{"csv": {"path": file}}` (station
//! history, fitted before the run) or `{"weibull": dir}`. Thresholds default
//! to Lawson LDDC.

use crate::core_types::{AngleSet, MetersPerSecond};
use crate::criteria::{ComfortMethod, ThresholdSet};
use crate::error::ConfigError;
use crate::field::VelocityRatioSource;
use crate::lawson::{EngineConfig, WeatherInput};
use crate::weather::HistoryColumns;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Wind directions, as a list or an evenly spaced range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AngleSpec {
    /// Explicit directions
    List(Vec<f64>),
    /// `count` directions from `start`, `end` excluded
    Range { start: f64, end: f64, count: usize },
}

impl AngleSpec {
    /// Build the angle set
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAngles` for an empty or out-of-range set.
    pub fn to_angle_set(&self) -> Result<AngleSet, ConfigError> {
        match self {
            AngleSpec::List(angles) => AngleSet::new(angles),
            AngleSpec::Range { start, end, count } => AngleSet::evenly_spaced(*start, *end, *count),
        }
    }
}

/// Weather input as written in the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSpec {
    /// `EnergyPlus` weather file
    Epw(PathBuf),
    /// Station history to fit
    Csv {
        path: PathBuf,
        #[serde(default)]
        columns: HistoryColumns,
    },
    /// Directory of Weibull tables
    Weibull(PathBuf),
}

impl From<WeatherSpec> for WeatherInput {
    fn from(spec: WeatherSpec) -> Self {
        match spec {
            WeatherSpec::Epw(path) => WeatherInput::Epw(path),
            WeatherSpec::Csv { path, columns } => WeatherInput::History { path, columns },
            WeatherSpec::Weibull(dir) => WeatherInput::WeibullTables(dir),
        }
    }
}

fn default_vr_stem() -> String {
    "VR".to_string()
}

fn default_true() -> bool {
    true
}

/// Run configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Case name, part of the velocity ratio file names
    pub case: String,
    /// Simulated wind directions
    pub angles: AngleSpec,
    /// `epw` or `weibull`
    pub method: String,
    /// Directory of the per-direction velocity ratio files
    pub vr_dir: PathBuf,
    /// Stem of the velocity ratio file names
    #[serde(default = "default_vr_stem")]
    pub vr_stem: String,
    /// Result path; its directory receives the output and its stem prefixes
    /// every file name
    pub lawson_output: PathBuf,
    /// Wind climate input
    pub weather: WeatherSpec,
    /// Run the seasonal passes too
    #[serde(default)]
    pub seasonal: bool,
    /// Reference wind speed (m/s) of the velocity ratios
    #[serde(default)]
    pub reference_speed: Option<f64>,
    /// Custom criteria, Lawson LDDC if absent
    #[serde(default)]
    pub thresholds: Option<ThresholdSet>,
    /// Classify the surface field
    #[serde(default = "default_true")]
    pub lawson_calculate: bool,
    /// Classify the receptors
    #[serde(default)]
    pub lawson_receptors: bool,
}

impl RunConfig {
    /// Parse a configuration from JSON text
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidConfig` for malformed JSON or invalid
    /// threshold values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
    }

    /// Load a configuration file
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidConfig` if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_json(&contents)
    }

    /// Write the configuration as pretty JSON
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidConfig` if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        fs::write(path.as_ref(), contents)
            .map_err(|e| ConfigError::InvalidConfig(format!("{}: {e}", path.as_ref().display())))
    }

    /// Validate into engine settings
    ///
    /// # Errors
    /// Returns a `ConfigError` for an unknown method, invalid angles, a
    /// non-positive reference speed or a weather input the method cannot use.
    pub fn into_engine(self) -> Result<EngineConfig, ConfigError> {
        let method: ComfortMethod = self.method.parse()?;
        let angles = self.angles.to_angle_set()?;

        let reference_speed = match self.reference_speed {
            Some(v) if !MetersPerSecond::new(v).is_positive() => {
                return Err(ConfigError::InvalidConfig(format!(
                    "reference speed must be positive, got {v}"
                )))
            }
            other => other.map(MetersPerSecond::new),
        };

        let output_dir = self
            .lawson_output
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let output_stem = self
            .lawson_output
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ConfigError::InvalidConfig(format!(
                    "lawson_output '{}' has no file name",
                    self.lawson_output.display()
                ))
            })?
            .to_string();

        let config = EngineConfig {
            angles,
            method,
            thresholds: self.thresholds.unwrap_or_default(),
            velocity_ratios: VelocityRatioSource {
                dir: self.vr_dir,
                stem: self.vr_stem,
                case: self.case,
            },
            output_dir,
            output_stem,
            weather: self.weather.into(),
            seasonal: self.seasonal,
            reference_speed,
        };
        config.validate()?;
        Ok(config)
    }
}
