//! Velocity ratio inputs produced by the CFD backend

pub mod merge;
pub mod velocity_ratio;

pub use merge::merge_receptor_parts;
pub use velocity_ratio::*;
