//! Weather inputs and wind climate statistics
//!
//! - [`epw`]: hourly typical-year records from `EnergyPlus` weather files
//! - [`history`]: multi-year station exports used for Weibull fitting
//! - [`weibull`]: per-direction Weibull fits and their CSV tables
//! - [`climate`]: the per-pass statistics the exceedance calculation consumes

pub mod climate;
pub mod epw;
pub mod history;
pub mod season;
pub mod series;
pub mod weibull;

pub use climate::{
    empirical_passes, parametric_passes, ClimatePass, EmpiricalClimate, EmpiricalSlice,
    ParametricClimate, WindClimateSource,
};
pub use epw::read_epw;
pub use history::{read_history, HistoryColumns};
pub use season::{ClimatePeriod, Season};
pub use series::{DirectionalSamples, WindRecord, WindSeries, HOURS_PER_YEAR};
pub use weibull::{
    fit_tables, load_tables, DirectionalWeibull, FitError, WeibullParams, WeibullTable,
    MIN_FIT_SAMPLES,
};
