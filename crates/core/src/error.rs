//! Error taxonomy for the classification pipeline
//!
//! - [`ConfigError`]: the run cannot start (bad thresholds, angles, method names)
//! - [`InputError`]: one artifact cannot be produced (missing or malformed data)
//! - [`PointError`]: one point could not be classified; siblings are unaffected
//!
//! [`LawsonError`] wraps the first two for functions that can fail either way.

use std::fmt;
use std::path::PathBuf;

/// Fatal configuration errors, raised before any point is processed
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Comfort method name not recognised
    UnknownMethod(String),
    /// Angle set empty, out of range or not finite
    InvalidAngles(String),
    /// A threshold speed is zero, negative or not finite
    NonPositiveThreshold { speed: f64 },
    /// Comfort thresholds not strictly ascending, or safety not above comfort
    UnorderedThresholds(String),
    /// Frequency budget outside `[0, 1]`
    InvalidBudget { speed: f64, budget: f64 },
    /// Budget grows as the threshold increases
    NonMonotonicBudget { lower: f64, higher: f64 },
    /// Threshold and budget lists have different lengths
    LengthMismatch { thresholds: usize, budgets: usize },
    /// Exceedance vector shorter than the frequency budget
    ExceedanceTooShort { exceedance: usize, budgets: usize },
    /// Run configuration file unreadable or malformed
    InvalidConfig(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownMethod(name) => {
                write!(f, "Unknown comfort method '{name}', expected 'epw' or 'weibull'")
            }
            ConfigError::InvalidAngles(msg) => write!(f, "Invalid wind angles: {msg}"),
            ConfigError::NonPositiveThreshold { speed } => {
                write!(f, "Threshold speeds must be finite and positive, got {speed}")
            }
            ConfigError::UnorderedThresholds(msg) => write!(f, "Unordered thresholds: {msg}"),
            ConfigError::InvalidBudget { speed, budget } => write!(
                f,
                "Frequency budget {budget} for threshold {speed} m/s is outside [0, 1]"
            ),
            ConfigError::NonMonotonicBudget { lower, higher } => write!(
                f,
                "Frequency budget for {higher} m/s exceeds the budget for {lower} m/s"
            ),
            ConfigError::LengthMismatch {
                thresholds,
                budgets,
            } => write!(
                f,
                "{thresholds} thresholds but {budgets} frequency budgets"
            ),
            ConfigError::ExceedanceTooShort {
                exceedance,
                budgets,
            } => write!(
                f,
                "Exceedance vector has {exceedance} entries but {budgets} budgets are configured"
            ),
            ConfigError::InvalidConfig(msg) => write!(f, "Invalid run configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Input-data errors, fatal for the artifact being produced
#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    /// A required file does not exist
    MissingFile(PathBuf),
    /// File exists but holds no data rows
    EmptyFile(PathBuf),
    /// File could not be read or written
    Io { path: PathBuf, msg: String },
    /// CSV record malformed or a required column absent
    Csv { path: PathBuf, msg: String },
    /// Point present for one angle but not for another
    Misaligned { path: PathBuf, msg: String },
    /// Weibull fit impossible for a direction bucket
    FitFailed {
        period: String,
        direction: f64,
        samples: usize,
        reason: String,
    },
    /// Weibull parameters that do not describe a distribution
    InvalidDistribution {
        period: String,
        direction: f64,
        msg: String,
    },
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::MissingFile(path) => write!(f, "File not found: {}", path.display()),
            InputError::EmptyFile(path) => write!(f, "File has no data rows: {}", path.display()),
            InputError::Io { path, msg } => write!(f, "IO error on {}: {msg}", path.display()),
            InputError::Csv { path, msg } => write!(f, "Malformed CSV {}: {msg}", path.display()),
            InputError::Misaligned { path, msg } => {
                write!(f, "Point misalignment in {}: {msg}", path.display())
            }
            InputError::FitFailed {
                period,
                direction,
                samples,
                reason,
            } => write!(
                f,
                "Weibull fit failed for {period}, direction {direction}° ({samples} samples): {reason}"
            ),
            InputError::InvalidDistribution {
                period,
                direction,
                msg,
            } => write!(
                f,
                "Invalid Weibull parameters for {period}, direction {direction}°: {msg}"
            ),
        }
    }
}

impl std::error::Error for InputError {}

impl InputError {
    /// Wrap an IO error with the path it occurred on
    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            InputError::MissingFile(path)
        } else {
            InputError::Io {
                path,
                msg: err.to_string(),
            }
        }
    }

    /// Wrap a CSV error with the path it occurred on
    pub(crate) fn csv(path: impl Into<PathBuf>, err: &csv::Error) -> Self {
        let path = path.into();
        if let csv::ErrorKind::Io(io) = err.kind() {
            return InputError::io(path, io);
        }
        InputError::Csv {
            path,
            msg: err.to_string(),
        }
    }
}

/// Failure isolated to a single point
#[derive(Debug, Clone, PartialEq)]
pub struct PointError {
    /// Index of the point within the field
    pub index: usize,
    /// Human-readable point label (receptor name or coordinates)
    pub label: String,
    /// What went wrong
    pub reason: String,
}

impl fmt::Display for PointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point {} ({}): {}", self.index, self.label, self.reason)
    }
}

impl std::error::Error for PointError {}

/// Any error that can abort a classification pass
#[derive(Debug, Clone, PartialEq)]
pub enum LawsonError {
    /// Configuration problem, the whole run is invalid
    Config(ConfigError),
    /// Input data problem, only this artifact is lost
    Input(InputError),
}

impl fmt::Display for LawsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LawsonError::Config(e) => write!(f, "{e}"),
            LawsonError::Input(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LawsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LawsonError::Config(e) => Some(e),
            LawsonError::Input(e) => Some(e),
        }
    }
}

impl From<ConfigError> for LawsonError {
    fn from(e: ConfigError) -> Self {
        LawsonError::Config(e)
    }
}

impl From<InputError> for LawsonError {
    fn from(e: InputError) -> Self {
        LawsonError::Input(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_missing_file() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let mapped = InputError::io("VR_case_0.0.csv", &err);
        assert_eq!(mapped, InputError::MissingFile(PathBuf::from("VR_case_0.0.csv")));
    }

    #[test]
    fn test_display_messages() {
        let err = ConfigError::UnknownMethod("gumbel".to_string());
        assert!(err.to_string().contains("gumbel"));

        let err: LawsonError = InputError::EmptyFile(PathBuf::from("x.csv")).into();
        assert!(matches!(err, LawsonError::Input(_)));
        assert!(err.to_string().contains("x.csv"));
    }
}
