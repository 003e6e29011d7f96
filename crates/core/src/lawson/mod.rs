//! Lawson LDDC wind comfort classification
//!
//! [`ExceedanceCalculator`] turns a point's velocity ratios and a wind climate
//! into threshold exceedance frequencies, [`ComfortClassifier`] maps those to
//! a class, and [`LawsonEngine`] runs both over whole fields and writes the
//! results.

pub mod classifier;
pub mod engine;
pub mod exceedance;
pub mod output;

pub use classifier::{assign_class, ClassLabels, ComfortClass, ComfortClassifier};
pub use engine::{
    EngineConfig, FailedPass, LawsonEngine, PassArtifact, WeatherInput, WriteResult,
};
pub use exceedance::{is_valid_ratio, ExceedanceCalculator, ExceedanceVector, RatioError};
pub use output::{
    output_path, read_receptor_csv, write_field_csv, write_receptor_csv, ClassifiedPoint,
    ReceptorRow, CLASS_COLUMN,
};
