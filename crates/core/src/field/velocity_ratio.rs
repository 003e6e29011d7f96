//! Per-direction velocity ratio field
//!
//! The CFD backend writes one CSV per wind direction with columns
//! `Points:0, Points:1, Points:2, VR` (plus `Name` for receptors). This module
//! reads all directions into one point-major table so each point's ratios are
//! a contiguous slice, which is what the per-point classification consumes.

use crate::core_types::{AngleSet, Degrees, Vec3};
use crate::error::InputError;
use crate::lawson::is_valid_ratio;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Coordinates are matched across directions after rounding to this resolution (m)
const COORDINATE_RESOLUTION: f64 = 1e-6;

/// Whether the field covers whole surfaces or named receptor locations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldMode {
    /// Every sampled point of the evaluation surfaces
    Surface,
    /// Named receptor locations, tabulated individually
    Receptors,
}

/// Identity of a sample point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointId {
    /// Anonymous surface point
    Coordinates(Vec3),
    /// Named receptor
    Receptor { name: String, position: Vec3 },
}

impl PointId {
    /// Spatial position of the point
    pub fn position(&self) -> Vec3 {
        match self {
            PointId::Coordinates(p) | PointId::Receptor { position: p, .. } => *p,
        }
    }

    /// Receptor name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            PointId::Coordinates(_) => None,
            PointId::Receptor { name, .. } => Some(name),
        }
    }

    fn key(&self) -> PointKey {
        let p = self.position();
        let quantize = |v: f64| (v / COORDINATE_RESOLUTION).round() as i64;
        PointKey {
            name: self.name().map(str::to_owned),
            cell: [quantize(p.x), quantize(p.y), quantize(p.z)],
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Coordinates(p) => write!(f, "({:.3}, {:.3}, {:.3})", p.x, p.y, p.z),
            PointId::Receptor { name, .. } => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PointKey {
    name: Option<String>,
    cell: [i64; 3],
}

/// Where the per-direction velocity ratio files live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityRatioSource {
    /// Directory holding the per-direction CSV files
    pub dir: PathBuf,
    /// File stem shared by all directions (e.g. `VR`)
    pub stem: String,
    /// Case name inserted between stem and angle
    pub case: String,
}

impl VelocityRatioSource {
    /// File holding the ratios for one direction
    ///
    /// `VR_<case>_<angle>.csv` for surfaces, `VR_receptors_<case>_<angle>.csv`
    /// for receptors.
    pub fn path_for(&self, angle: Degrees, mode: FieldMode) -> PathBuf {
        let name = match mode {
            FieldMode::Surface => format!("{}_{}_{}.csv", self.stem, self.case, angle.file_label()),
            FieldMode::Receptors => format!(
                "{}_receptors_{}_{}.csv",
                self.stem,
                self.case,
                angle.file_label()
            ),
        };
        self.dir.join(name)
    }
}

#[derive(Debug, Deserialize)]
struct VelocityRatioRow {
    #[serde(rename = "Points:0")]
    x: f64,
    #[serde(rename = "Points:1")]
    y: f64,
    #[serde(rename = "Points:2")]
    z: f64,
    #[serde(rename = "VR")]
    ratio: f64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
}

/// Velocity ratios of every point for every direction of a run
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityRatioField {
    mode: FieldMode,
    angles: AngleSet,
    points: Vec<PointId>,
    /// Point-major: `ratios[i * n_angles + a]`
    ratios: Vec<f64>,
}

impl VelocityRatioField {
    /// Build a field from in-memory ratios, one row of `angles.len()` values per point
    ///
    /// Negative or non-finite ratios are kept; the point fails on its own
    /// when it is classified.
    ///
    /// # Errors
    /// Returns `InputError::Misaligned` if a row does not hold one ratio per
    /// angle.
    pub fn from_parts(
        mode: FieldMode,
        angles: AngleSet,
        points: Vec<PointId>,
        ratios: &[Vec<f64>],
    ) -> Result<Self, InputError> {
        let origin = PathBuf::from("<memory>");
        if points.len() != ratios.len() {
            return Err(InputError::Misaligned {
                path: origin,
                msg: format!("{} points but {} ratio rows", points.len(), ratios.len()),
            });
        }

        let mut flat = Vec::with_capacity(points.len() * angles.len());
        for (row, values) in ratios.iter().enumerate() {
            if values.len() != angles.len() {
                return Err(InputError::Misaligned {
                    path: origin,
                    msg: format!(
                        "point {row} has {} ratios for {} angles",
                        values.len(),
                        angles.len()
                    ),
                });
            }
            flat.extend_from_slice(values);
        }

        Ok(Self {
            mode,
            angles,
            points,
            ratios: flat,
        })
    }

    /// Read and align the per-direction CSV files of a run
    ///
    /// Directions are read in parallel. The first direction fixes the point
    /// order; every other direction must hold exactly the same points, in any
    /// order. Invalid ratios (`nan` for samples inside solids) are kept and
    /// counted.
    ///
    /// # Errors
    /// Returns an `InputError` if a file is missing, empty or malformed, or
    /// the points differ between directions.
    pub fn load(
        source: &VelocityRatioSource,
        angles: &AngleSet,
        mode: FieldMode,
    ) -> Result<Self, InputError> {
        let per_angle: Vec<(PathBuf, Vec<(PointId, f64)>)> = angles
            .as_slice()
            .par_iter()
            .map(|&angle| {
                let path = source.path_for(angle, mode);
                read_direction_file(&path, mode).map(|rows| (path, rows))
            })
            .collect::<Result<_, _>>()?;

        let (first_path, first_rows) = &per_angle[0];
        let n_angles = angles.len();
        let n_points = first_rows.len();

        let mut index: FxHashMap<PointKey, usize> = FxHashMap::default();
        index.reserve(n_points);
        for (i, (point, _)) in first_rows.iter().enumerate() {
            if index.insert(point.key(), i).is_some() {
                return Err(InputError::Misaligned {
                    path: first_path.clone(),
                    msg: format!("duplicate point {point}"),
                });
            }
        }

        let points: Vec<PointId> = first_rows.iter().map(|(p, _)| p.clone()).collect();
        let mut ratios = vec![0.0; n_points * n_angles];

        for (a, (path, rows)) in per_angle.iter().enumerate() {
            if rows.len() != n_points {
                return Err(InputError::Misaligned {
                    path: path.clone(),
                    msg: format!(
                        "{} points, but {} has {}",
                        rows.len(),
                        first_path.display(),
                        n_points
                    ),
                });
            }
            let mut seen = vec![false; n_points];
            for (point, ratio) in rows {
                let Some(&i) = index.get(&point.key()) else {
                    return Err(InputError::Misaligned {
                        path: path.clone(),
                        msg: format!("point {point} missing from {}", first_path.display()),
                    });
                };
                if std::mem::replace(&mut seen[i], true) {
                    return Err(InputError::Misaligned {
                        path: path.clone(),
                        msg: format!("duplicate point {point}"),
                    });
                }
                ratios[i * n_angles + a] = *ratio;
            }
        }

        let invalid = ratios
            .chunks(n_angles)
            .filter(|r| !r.iter().all(|&v| is_valid_ratio(v)))
            .count();
        if invalid > 0 {
            warn!(
                points = invalid,
                "Points with negative or non-finite velocity ratios will not be classified"
            );
        }

        info!(
            points = n_points,
            angles = n_angles,
            mode = ?mode,
            "Loaded velocity ratio field"
        );

        Ok(Self {
            mode,
            angles: angles.clone(),
            points,
            ratios,
        })
    }

    /// Surface or receptor field
    #[inline]
    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    /// Directions of the run
    #[inline]
    pub fn angles(&self) -> &AngleSet {
        &self.angles
    }

    /// Number of points
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the field has no points
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points in field order
    #[inline]
    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    /// Ratios of point `index`, one per angle in angle order
    #[inline]
    pub fn ratios(&self, index: usize) -> &[f64] {
        let n = self.angles.len();
        &self.ratios[index * n..(index + 1) * n]
    }
}

fn read_direction_file(path: &Path, mode: FieldMode) -> Result<Vec<(PointId, f64)>, InputError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| InputError::csv(path, &e))?;

    let mut rows = Vec::new();
    for (row, record) in reader.deserialize::<VelocityRatioRow>().enumerate() {
        let record = record.map_err(|e| InputError::csv(path, &e))?;

        let position = Vec3::new(record.x, record.y, record.z);
        let point = match (mode, record.name) {
            (FieldMode::Surface, _) => PointId::Coordinates(position),
            (FieldMode::Receptors, Some(name)) => PointId::Receptor { name, position },
            (FieldMode::Receptors, None) => {
                return Err(InputError::Csv {
                    path: path.to_path_buf(),
                    msg: format!("row {row} has no receptor Name"),
                });
            }
        };
        rows.push((point, record.ratio));
    }

    if rows.is_empty() {
        return Err(InputError::EmptyFile(path.to_path_buf()));
    }

    debug!(path = %path.display(), rows = rows.len(), "Read velocity ratio file");
    Ok(rows)
}
