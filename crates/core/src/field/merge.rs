//! Merge per-receptor velocity ratio exports into one table
//!
//! The renderer exports one `_VR<name>.csv` per receptor or surface into the
//! case directory. The classification reads a single file per direction with a
//! `Name` column, so the parts are concatenated here and then removed.

use crate::error::InputError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix of the partial exports written by the renderer
pub const PART_PREFIX: &str = "_VR";

/// List the partial exports in a case directory, sorted by file name
///
/// # Errors
/// Returns `InputError` if the directory cannot be read.
pub fn find_parts(case_dir: &Path) -> Result<Vec<PathBuf>, InputError> {
    let entries = fs::read_dir(case_dir).map_err(|e| InputError::io(case_dir, &e))?;

    let mut parts: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(PART_PREFIX) && n.ends_with(".csv"))
        })
        .collect();
    parts.sort();
    Ok(parts)
}

/// Receptor name encoded in a part file name (`_VRentrance.csv` -> `entrance`)
pub fn part_name(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_prefix(PART_PREFIX)?
        .strip_suffix(".csv")
}

/// Concatenate all parts of `case_dir` into `output`, adding a `Name` column
///
/// Parts are deleted once the merged file has been written. Returns the
/// number of data rows written.
///
/// # Errors
/// Returns `InputError::MissingFile` if there are no parts,
/// `InputError::Csv` if the parts disagree on their columns, and IO errors
/// from reading, writing or deleting.
pub fn merge_receptor_parts(case_dir: &Path, output: &Path) -> Result<usize, InputError> {
    let parts = find_parts(case_dir)?;
    if parts.is_empty() {
        return Err(InputError::MissingFile(case_dir.join(format!("{PART_PREFIX}*.csv"))));
    }

    let mut writer = csv::Writer::from_path(output).map_err(|e| InputError::csv(output, &e))?;
    let mut header: Option<csv::StringRecord> = None;
    let mut rows = 0;

    for part in &parts {
        let name = part_name(part).unwrap_or_default().to_string();
        let mut reader = csv::Reader::from_path(part).map_err(|e| InputError::csv(part, &e))?;
        let part_header = reader
            .headers()
            .map_err(|e| InputError::csv(part, &e))?
            .clone();

        match &header {
            None => {
                let mut merged = part_header.clone();
                merged.push_field("Name");
                writer
                    .write_record(&merged)
                    .map_err(|e| InputError::csv(output, &e))?;
                header = Some(part_header);
            }
            Some(expected) if *expected != part_header => {
                return Err(InputError::Csv {
                    path: part.clone(),
                    msg: "columns differ from the other receptor exports".to_string(),
                });
            }
            Some(_) => {}
        }

        for record in reader.records() {
            let mut record = record.map_err(|e| InputError::csv(part, &e))?;
            record.push_field(&name);
            writer
                .write_record(&record)
                .map_err(|e| InputError::csv(output, &e))?;
            rows += 1;
        }
        debug!(part = %part.display(), receptor = %name, "Merged receptor export");
    }

    writer.flush().map_err(|e| InputError::io(output, &e))?;

    for part in &parts {
        fs::remove_file(part).map_err(|e| InputError::io(part, &e))?;
    }

    info!(
        parts = parts.len(),
        rows,
        output = %output.display(),
        "Merged receptor velocity ratios"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_part_name() {
        assert_eq!(part_name(Path::new("case/_VRentrance.csv")), Some("entrance"));
        assert_eq!(part_name(Path::new("case/VR.csv")), None);
    }

    #[test]
    fn test_merge_adds_name_and_removes_parts() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_VRnorth.csv"),
            "Points:0,Points:1,Points:2,VR\n0,0,1.5,0.5\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("_VRentrance.csv"),
            "Points:0,Points:1,Points:2,VR\n3,4,1.5,0.9\n5,4,1.5,1.1\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let output = dir.path().join("VR_receptors.csv");
        let rows = merge_receptor_parts(dir.path(), &output).unwrap();
        assert_eq!(rows, 3);

        let merged = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = merged.lines().collect();
        assert_eq!(lines[0], "Points:0,Points:1,Points:2,VR,Name");
        assert_eq!(lines[1], "3,4,1.5,0.9,entrance");
        assert_eq!(lines[3], "0,0,1.5,0.5,north");

        assert!(find_parts(dir.path()).unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_merge_without_parts_fails() {
        let dir = TempDir::new().unwrap();
        let err = merge_receptor_parts(dir.path(), &dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, InputError::MissingFile(_)));
    }

    #[test]
    fn test_merge_rejects_mismatched_columns() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_VRa.csv"), "Points:0,VR\n0,0.5\n").unwrap();
        fs::write(dir.path().join("_VRb.csv"), "Points:0,Points:1,VR\n0,0,0.5\n").unwrap();
        let err = merge_receptor_parts(dir.path(), &dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, InputError::Csv { .. }));
        // Parts are kept when the merge fails
        assert_eq!(find_parts(dir.path()).unwrap().len(), 2);
    }
}
