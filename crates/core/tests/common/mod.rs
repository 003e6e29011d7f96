//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use wind_comfort_core::{AngleSet, FieldMode, VelocityRatioSource};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub const CASE: &str = "tower";

const EPW_HEADER: &str = "LOCATION,Test Site,-,GBR,Synthetic,000000,51.5,-0.1,0.0,10.0
DESIGN CONDITIONS,0
TYPICAL/EXTREME PERIODS,0
GROUND TEMPERATURES,0
HOLIDAYS/DAYLIGHT SAVINGS,No,0,0,0
COMMENTS 1,Synthetic wind year
COMMENTS 2,
DATA PERIODS,1,1,Data,Sunday, 1/ 1,12/31
";

/// Velocity ratio source rooted in `dir`
pub fn vr_source(dir: &Path) -> VelocityRatioSource {
    VelocityRatioSource {
        dir: dir.to_path_buf(),
        stem: "VR".to_string(),
        case: CASE.to_string(),
    }
}

/// Write one surface file per angle; `ratios[p][a]` is the ratio of point `p`
/// at angle `a`. Rows of odd angles are written in reverse order.
pub fn write_surface_vr(dir: &Path, angles: &AngleSet, points: &[[f64; 3]], ratios: &[Vec<f64>]) {
    let source = vr_source(dir);
    for (a, angle) in angles.iter().enumerate() {
        let mut content = String::from("Points:0,Points:1,Points:2,VR\n");
        let mut rows: Vec<usize> = (0..points.len()).collect();
        if a % 2 == 1 {
            rows.reverse();
        }
        for p in rows {
            let [x, y, z] = points[p];
            writeln!(content, "{x},{y},{z},{}", ratios[p][a]).unwrap();
        }
        fs::write(source.path_for(angle, FieldMode::Surface), content).unwrap();
    }
}

/// Write one receptor file per angle
pub fn write_receptor_vr(dir: &Path, angles: &AngleSet, names: &[&str], ratios: &[Vec<f64>]) {
    let source = vr_source(dir);
    for (a, angle) in angles.iter().enumerate() {
        let mut content = String::from("Points:0,Points:1,Points:2,VR,Name\n");
        for (p, name) in names.iter().enumerate() {
            writeln!(content, "{p},0,1.5,{},{name}", ratios[p][a]).unwrap();
        }
        fs::write(source.path_for(angle, FieldMode::Receptors), content).unwrap();
    }
}

/// Write an EPW year with one record per hour; `wind(hour_of_year)` gives
/// `(direction, speed)`
pub fn write_epw_year(path: &Path, wind: impl Fn(usize) -> (f64, f64)) -> PathBuf {
    let mut content = EPW_HEADER.to_string();
    let mut date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
    let mut hour_of_year = 0;
    while date.year() == 2021 {
        for hour in 1..=24 {
            let (direction, speed) = wind(hour_of_year);
            writeln!(
                content,
                "1990,{},{},{hour},60,?9?9?9?9E0?9?9?9?9?9?9?9?9?9?9?9?9?9?9?9*9*9?9?9?9,\
                 7.0,5.0,87,101300,0,0,300,0,0,0,0,0,0,0,{direction},{speed},10,10,9.9,77777,9,999999999,0,0.0,0,88,0.000,0.0,0.0",
                date.month(),
                date.day()
            )
            .unwrap();
            hour_of_year += 1;
        }
        date = date.succ_opt().unwrap();
    }
    fs::write(path, content).unwrap();
    path.to_path_buf()
}
