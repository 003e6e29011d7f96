//! Classified CSV results
//!
//! Two layouts are written:
//!
//! | Mode      | Header                                  | Rows                           |
//! |-----------|-----------------------------------------|--------------------------------|
//! | Surface   | `Class,Points:0,Points:1,Points:2`      | integer class, 6-decimal coords |
//! | Receptors | `Name,a,b,...,Calculated class`         | exceedance in %, class letter  |

use super::classifier::{ClassLabels, ComfortClass};
use super::exceedance::ExceedanceVector;
use crate::criteria::ComfortMethod;
use crate::error::InputError;
use crate::field::{FieldMode, PointId};
use crate::weather::ClimatePeriod;
use std::path::{Path, PathBuf};

/// Header of the class column in receptor tables
pub const CLASS_COLUMN: &str = "Calculated class";

/// Classification result of one point
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedPoint {
    /// Point identity and coordinates
    pub point: PointId,
    /// Assigned class
    pub class: ComfortClass,
    /// Exceedance frequencies, ascending threshold order
    pub exceedance: ExceedanceVector,
}

/// Output file of a pass: `<stem>_<method>_<period>.csv`, with a
/// `_receptors` suffix for receptor tables
pub fn output_path(
    dir: &Path,
    stem: &str,
    method: ComfortMethod,
    period: ClimatePeriod,
    mode: FieldMode,
) -> PathBuf {
    let suffix = match mode {
        FieldMode::Surface => "",
        FieldMode::Receptors => "_receptors",
    };
    dir.join(format!("{stem}_{method}_{period}{suffix}.csv"))
}

/// Write the surface layout
///
/// # Errors
/// Returns an `InputError` if the file cannot be written.
pub fn write_field_csv(path: &Path, points: &[ClassifiedPoint]) -> Result<(), InputError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| InputError::csv(path, &e))?;
    writer
        .write_record(["Class", "Points:0", "Points:1", "Points:2"])
        .map_err(|e| InputError::csv(path, &e))?;

    for p in points {
        let pos = p.point.position();
        writer
            .write_record([
                p.class.to_string(),
                format!("{:.6}", pos.x),
                format!("{:.6}", pos.y),
                format!("{:.6}", pos.z),
            ])
            .map_err(|e| InputError::csv(path, &e))?;
    }
    writer.flush().map_err(|e| InputError::io(path, &e))
}

/// Write the receptor layout
///
/// # Errors
/// Returns an `InputError` if the file cannot be written.
pub fn write_receptor_csv(
    path: &Path,
    points: &[ClassifiedPoint],
    labels: &ClassLabels,
) -> Result<(), InputError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| InputError::csv(path, &e))?;

    let mut header = vec!["Name".to_string()];
    header.extend(labels.threshold_columns());
    header.push(CLASS_COLUMN.to_string());
    writer
        .write_record(&header)
        .map_err(|e| InputError::csv(path, &e))?;

    for p in points {
        let mut record = Vec::with_capacity(header.len());
        record.push(p.point.to_string());
        record.extend(p.exceedance.percentages().map(|v| format!("{v:.6}")));
        record.push(labels.label(p.class).unwrap_or(ClassLabels::UNSAFE).to_string());
        writer
            .write_record(&record)
            .map_err(|e| InputError::csv(path, &e))?;
    }
    writer.flush().map_err(|e| InputError::io(path, &e))
}

/// One row of a receptor table read back from disk
#[derive(Debug, Clone, PartialEq)]
pub struct ReceptorRow {
    /// Receptor name
    pub name: String,
    /// Exceedance per threshold in percent
    pub exceedance_percent: Vec<f64>,
    /// Class decoded from its letter
    pub class: ComfortClass,
}

/// Read a receptor table, decoding class letters with labels built from the
/// header's threshold columns
///
/// # Errors
/// Returns `InputError::Csv` for an unexpected header, a non-numeric
/// exceedance or an unknown class letter.
pub fn read_receptor_csv(path: &Path) -> Result<(ClassLabels, Vec<ReceptorRow>), InputError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| InputError::csv(path, &e))?;
    let header = reader
        .headers()
        .map_err(|e| InputError::csv(path, &e))?
        .clone();

    let malformed = |msg: String| InputError::Csv {
        path: path.to_path_buf(),
        msg,
    };
    if header.len() < 3 || &header[0] != "Name" || &header[header.len() - 1] != CLASS_COLUMN {
        return Err(malformed(format!("unexpected receptor header {header:?}")));
    }

    let labels = ClassLabels::new(header.len() - 2);
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InputError::csv(path, &e))?;
        let last = record.len() - 1;
        let exceedance_percent = (1..last)
            .map(|c| {
                record[c]
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("row {i}, column {c}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let class = labels
            .class_of(&record[last])
            .ok_or_else(|| malformed(format!("row {i}: unknown class '{}'", &record[last])))?;
        rows.push(ReceptorRow {
            name: record[0].to_string(),
            exceedance_percent,
            class,
        });
    }
    Ok((labels, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Vec3;
    use crate::criteria::ThresholdSet;
    use crate::weather::Season;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_output_paths() {
        let dir = Path::new("results");
        assert_eq!(
            output_path(dir, "Lawson", ComfortMethod::Epw, ClimatePeriod::Annual, FieldMode::Surface),
            dir.join("Lawson_epw_annual.csv")
        );
        assert_eq!(
            output_path(
                dir,
                "Lawson",
                ComfortMethod::Weibull,
                ClimatePeriod::Season(Season::Winter),
                FieldMode::Receptors
            ),
            dir.join("Lawson_weibull_winter_receptors.csv")
        );
    }

    #[test]
    fn test_field_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.csv");
        let points = vec![ClassifiedPoint {
            point: PointId::Coordinates(Vec3::new(1.0, -2.5, 1.5)),
            class: ComfortClass(3),
            exceedance: ExceedanceVector::zeros(5),
        }];
        write_field_csv(&path, &points).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Class,Points:0,Points:1,Points:2\n3,1.000000,-2.500000,1.500000\n"
        );
    }

    #[test]
    fn test_receptor_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("receptors.csv");
        let points = vec![ClassifiedPoint {
            point: PointId::Receptor {
                name: "entrance".to_string(),
                position: Vec3::zeros(),
            },
            class: ComfortClass(4),
            exceedance: ExceedanceVector::from_raw(
                ThresholdSet::lawson_lddc()
                    .thresholds()
                    .iter()
                    .map(|t| t.group)
                    .zip([1.0, 0.5, 0.25, 0.125, 0.001]),
            ),
        }];
        write_receptor_csv(&path, &points, &ClassLabels::new(5)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Name,a,b,c,d,e,Calculated class\n\
             entrance,100.000000,50.000000,25.000000,12.500000,0.100000,U\n"
        );
    }

    #[test]
    fn test_read_rejects_unknown_class() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("receptors.csv");
        fs::write(&path, "Name,a,b,Calculated class\nnorth,1.0,0.0,z\n").unwrap();
        assert!(matches!(read_receptor_csv(&path), Err(InputError::Csv { .. })));
    }
}
