//! Vector type alias for 3D point coordinates.

use nalgebra::Vector3;

/// 3D vector type for sample point positions.
///
/// This is a simple alias for `nalgebra::Vector3<f64>`. Coordinates come from
/// the CFD mesh (`Points:0..2` columns) and are written back unchanged, so they
/// are kept in double precision.
pub type Vec3 = Vector3<f64>;
