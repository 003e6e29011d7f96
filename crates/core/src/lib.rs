//! Wind Comfort Core Library
//!
//! Post-processing of wind-microclimate CFD results into Lawson LDDC
//! pedestrian comfort classes.
//!
//! ## Pipeline
//!
//! 1. Velocity ratios (local speed / reference speed) are read for every
//!    simulated wind direction ([`field`])
//! 2. A wind climate is built per period, either hourly from an `EnergyPlus`
//!    weather file or as per-direction Weibull fits ([`weather`])
//! 3. Every point gets the frequency with which it exceeds each threshold
//!    speed and the comfort class that follows ([`lawson`])
//! 4. Classified points are written as CSV, one file per period
//!
//! ## Example
//!
//! ```
//! use wind_comfort_core::lawson::assign_class;
//!
//! let budget = [0.05, 0.05, 0.05, 0.05, 0.00022];
//! let class = assign_class(&[0.10, 0.08, 0.03, 0.01, 0.0001], &budget).unwrap();
//! assert_eq!(class.value(), 2);
//! ```

// Core types and utilities
pub mod core_types;
pub mod criteria;
pub mod error;

// Inputs
pub mod config;
pub mod field;
pub mod weather;

// Classification
pub mod lawson;

// Re-export core types
pub use core_types::{AngleSet, Degrees, MetersPerSecond, MilesPerHour, Vec3};
pub use criteria::{ComfortMethod, Threshold, ThresholdGroup, ThresholdSet};
pub use error::{ConfigError, InputError, LawsonError, PointError};

// Re-export pipeline types
pub use config::RunConfig;
pub use field::{FieldMode, PointId, VelocityRatioField, VelocityRatioSource};
pub use lawson::{
    ClassLabels, ComfortClass, ComfortClassifier, EngineConfig, ExceedanceCalculator,
    ExceedanceVector, LawsonEngine, WeatherInput, WriteResult,
};
pub use weather::{ClimatePeriod, Season, WindClimateSource, WindSeries};
