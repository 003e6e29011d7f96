//! Core types and utilities

pub mod angles;
pub mod units;
pub mod vec3;

pub use angles::AngleSet;
pub use units::*;
pub use vec3::Vec3;
