//! Wind direction sets and direction bucketing
//!
//! An [`AngleSet`] fixes the wind directions simulated by the CFD backend. It
//! defines the per-direction velocity ratio slots and the direction buckets
//! weather records are sorted into.
//!
//! # Bucketing
//!
//! With spacing `s` between consecutive angles, a record with direction `d`
//! belongs to angle `a` when
//!
//! ```text
//! a - s/2 < d ≤ a + s/2      (mod 360)
//! ```
//!
//! so a direction sitting exactly on a bucket edge belongs to the bucket whose
//! upper edge it is, and 350° falls into the 0° bucket for a 22.5° spacing.

use super::units::Degrees;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Ordered, unique wind directions in `[0, 360)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSet {
    angles: Vec<Degrees>,
}

impl AngleSet {
    /// Build from an arbitrary list (sorted and deduplicated)
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAngles` if the list is empty or holds a
    /// value that is not finite or lies outside `[0, 360)`.
    pub fn new(angles: &[f64]) -> Result<Self, ConfigError> {
        if angles.is_empty() {
            return Err(ConfigError::InvalidAngles("no wind angles given".to_string()));
        }
        if let Some(bad) = angles
            .iter()
            .find(|a| !a.is_finite() || **a < 0.0 || **a >= Degrees::FULL_TURN)
        {
            return Err(ConfigError::InvalidAngles(format!(
                "angle {bad} is outside [0, 360)"
            )));
        }

        let mut sorted: Vec<Degrees> = angles.iter().copied().map(Degrees::new).collect();
        sorted.sort();
        sorted.dedup();

        Ok(Self { angles: sorted })
    }

    /// Evenly spaced angles from `start` up to, but excluding, `end`
    ///
    /// Mirrors the usual `linspace(start, end, count, endpoint=False)` setup of
    /// a wind rose, e.g. `(0, 360, 16)` gives 0, 22.5, ..., 337.5.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidAngles` for a zero count, an empty or
    /// reversed range, or generated angles outside `[0, 360)`.
    pub fn evenly_spaced(start: f64, end: f64, count: usize) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::InvalidAngles("angle count must be positive".to_string()));
        }
        if !(start.is_finite() && end.is_finite()) || end <= start {
            return Err(ConfigError::InvalidAngles(format!(
                "angle range [{start}, {end}) is empty"
            )));
        }
        let step = (end - start) / count as f64;
        let angles: Vec<f64> = (0..count).map(|i| start + step * i as f64).collect();
        Self::new(&angles)
    }

    /// Number of directions
    #[inline]
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// Always false for a constructed set, kept for API symmetry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Directions in ascending order
    #[inline]
    pub fn as_slice(&self) -> &[Degrees] {
        &self.angles
    }

    /// Iterate over the directions
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, Degrees>> {
        self.angles.iter().copied()
    }

    /// Angular spacing between consecutive directions (360 for a single angle)
    pub fn spacing(&self) -> f64 {
        match self.angles.as_slice() {
            [first, second, ..] => **second - **first,
            _ => Degrees::FULL_TURN,
        }
    }

    /// Index of a configured angle, matched within 1e-6 degrees
    pub fn index_of(&self, angle: Degrees) -> Option<usize> {
        self.angles
            .iter()
            .position(|a| (**a - *angle).abs() < 1e-6)
    }

    /// Index of the direction bucket a weather record falls into
    ///
    /// Returns `None` when the angle set does not cover the whole circle and
    /// the direction lies in a gap.
    pub fn bucket_of(&self, direction: Degrees) -> Option<usize> {
        let spacing = self.spacing();
        if spacing >= Degrees::FULL_TURN {
            return Some(0);
        }
        let half = spacing / 2.0;
        let d = *direction.normalized();

        self.angles.iter().position(|a| {
            // Offset of d above the bucket's lower (open) edge, wrapped to [0, 360)
            let offset = (d - (**a - half)).rem_euclid(Degrees::FULL_TURN);
            offset > 0.0 && offset <= spacing
        })
    }
}

impl<'a> IntoIterator for &'a AngleSet {
    type Item = Degrees;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, Degrees>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wind_rose_16() -> AngleSet {
        AngleSet::evenly_spaced(0.0, 360.0, 16).unwrap()
    }

    #[test]
    fn test_evenly_spaced_excludes_end() {
        let angles = wind_rose_16();
        assert_eq!(angles.len(), 16);
        assert_eq!(angles.as_slice()[1], Degrees::new(22.5));
        assert_eq!(angles.as_slice()[15], Degrees::new(337.5));
        assert_eq!(angles.spacing(), 22.5);
    }

    #[test]
    fn test_new_sorts_and_dedups() {
        let angles = AngleSet::new(&[180.0, 0.0, 90.0, 90.0]).unwrap();
        let values: Vec<f64> = angles.iter().map(Degrees::value).collect();
        assert_eq!(values, vec![0.0, 90.0, 180.0]);
    }

    #[test]
    fn test_invalid_angles_rejected() {
        assert!(AngleSet::new(&[]).is_err());
        assert!(AngleSet::new(&[0.0, 360.0]).is_err());
        assert!(AngleSet::new(&[-10.0]).is_err());
        assert!(AngleSet::new(&[f64::NAN]).is_err());
        assert!(AngleSet::evenly_spaced(0.0, 360.0, 0).is_err());
        assert!(AngleSet::evenly_spaced(90.0, 0.0, 4).is_err());
    }

    #[test]
    fn test_bucket_interior_and_boundaries() {
        let angles = AngleSet::new(&[0.0, 90.0, 180.0, 270.0]).unwrap();

        assert_eq!(angles.bucket_of(Degrees::new(10.0)), Some(0));
        assert_eq!(angles.bucket_of(Degrees::new(100.0)), Some(1));

        // Upper edge inclusive, lower edge exclusive
        assert_eq!(angles.bucket_of(Degrees::new(45.0)), Some(0));
        assert_eq!(angles.bucket_of(Degrees::new(45.000001)), Some(1));
        assert_eq!(angles.bucket_of(Degrees::new(135.0)), Some(1));
        assert_eq!(angles.bucket_of(Degrees::new(225.0)), Some(2));
    }

    #[test]
    fn test_bucket_wraparound() {
        let angles = AngleSet::new(&[0.0, 90.0, 180.0, 270.0]).unwrap();

        assert_eq!(angles.bucket_of(Degrees::new(350.0)), Some(0));
        assert_eq!(angles.bucket_of(Degrees::new(360.0)), Some(0));
        assert_eq!(angles.bucket_of(Degrees::new(0.0)), Some(0));
        // 315 is the upper edge of the 270 bucket
        assert_eq!(angles.bucket_of(Degrees::new(315.0)), Some(3));
        assert_eq!(angles.bucket_of(Degrees::new(315.5)), Some(0));

        let rose = wind_rose_16();
        assert_eq!(rose.bucket_of(Degrees::new(348.75)), Some(15));
        assert_eq!(rose.bucket_of(Degrees::new(349.0)), Some(0));
        assert_eq!(rose.bucket_of(Degrees::new(11.25)), Some(0));
    }

    #[test]
    fn test_bucket_gap_and_single_angle() {
        // Two angles 90° apart leave most of the circle uncovered
        let partial = AngleSet::new(&[0.0, 90.0]).unwrap();
        assert_eq!(partial.bucket_of(Degrees::new(200.0)), None);

        let single = AngleSet::new(&[45.0]).unwrap();
        assert_eq!(single.bucket_of(Degrees::new(225.0)), Some(0));
    }

    #[test]
    fn test_index_of() {
        let rose = wind_rose_16();
        assert_eq!(rose.index_of(Degrees::new(45.0)), Some(2));
        assert_eq!(rose.index_of(Degrees::new(44.0)), None);
    }
}
