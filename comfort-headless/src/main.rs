use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use wind_comfort_core::field::merge_receptor_parts;
use wind_comfort_core::weather::{fit_tables, read_history, HistoryColumns};
use wind_comfort_core::{AngleSet, ClimatePeriod, LawsonEngine, LawsonError, RunConfig, WriteResult};

/// Lawson wind comfort post-processing
#[derive(Parser, Debug)]
#[command(name = "comfort-headless")]
#[command(about = "Classify CFD velocity ratios into Lawson comfort classes", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the classification described by a JSON configuration
    Classify {
        /// Run configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Classify the surface field (overrides the configuration flags)
        #[arg(long)]
        field: bool,

        /// Classify the receptors (overrides the configuration flags)
        #[arg(long)]
        receptors: bool,
    },

    /// Fit per-direction Weibull tables to a station history
    FitWeibull {
        /// Historical wind CSV (speeds in mph)
        #[arg(long)]
        history: PathBuf,

        /// Wind directions in degrees, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        angles: Vec<f64>,

        /// Directory receiving weibull_<period>.csv
        #[arg(short, long)]
        output_dir: PathBuf,

        /// Fit one table per season as well
        #[arg(short, long)]
        seasonal: bool,

        /// Timestamp column
        #[arg(long, default_value = "datetime")]
        datetime_column: String,

        /// Wind speed column
        #[arg(long, default_value = "windspeed")]
        speed_column: String,

        /// Wind direction column
        #[arg(long, default_value = "winddir")]
        direction_column: String,
    },

    /// Merge per-receptor velocity ratio exports into one table
    MergeReceptors {
        /// Directory holding the `_VR<name>.csv` parts
        #[arg(long)]
        case_dir: PathBuf,

        /// Merged CSV
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Classify {
            config,
            field,
            receptors,
        } => classify(&config, field, receptors),
        Command::FitWeibull {
            history,
            angles,
            output_dir,
            seasonal,
            datetime_column,
            speed_column,
            direction_column,
        } => {
            let columns = HistoryColumns {
                datetime: datetime_column,
                speed: speed_column,
                direction: direction_column,
            };
            fit_weibull(&history, &angles, &output_dir, seasonal, &columns)
        }
        Command::MergeReceptors { case_dir, output } => {
            let rows = merge_receptor_parts(&case_dir, &output)
                .with_context(|| format!("merging receptors in {}", case_dir.display()))?;
            info!(output = %output.display(), rows, "Merged receptor velocity ratios");
            Ok(())
        }
    }
}

fn classify(config: &Path, field: bool, receptors: bool) -> Result<()> {
    let run = RunConfig::load(config)
        .with_context(|| format!("loading configuration {}", config.display()))?;

    // Command line flags replace the configured selection
    let (run_field, run_receptors) = if field || receptors {
        (field, receptors)
    } else {
        (run.lawson_calculate, run.lawson_receptors)
    };
    if !run_field && !run_receptors {
        warn!("Neither field nor receptor classification is enabled");
        return Ok(());
    }

    let engine_config = run.into_engine().context("invalid configuration")?;
    let engine = LawsonEngine::new(engine_config).context("invalid configuration")?;

    let (field_result, receptor_result) = rayon::join(
        || run_field.then(|| engine.calculate(false)),
        || run_receptors.then(|| engine.calculate(true)),
    );

    let mut produced = false;
    let mut failures = Vec::new();
    for (label, result) in [("field", field_result), ("receptors", receptor_result)] {
        match result {
            None => {}
            Some(Ok(summary)) => produced |= report(label, &summary),
            Some(Err(e)) => {
                error!(run = label, error = %e, "Classification failed");
                failures.push(e);
            }
        }
    }

    if let Some(e) = failures.iter().find_map(|e| match e {
        LawsonError::Config(c) => Some(c),
        LawsonError::Input(_) => None,
    }) {
        bail!("configuration error: {e}");
    }
    if !produced {
        bail!("no classification pass produced output");
    }
    Ok(())
}

/// Log a run summary; returns true if anything was written
fn report(label: &str, summary: &WriteResult) -> bool {
    for artifact in &summary.artifacts {
        info!(
            run = label,
            period = %artifact.period,
            points = artifact.points,
            histogram = ?artifact.histogram,
            path = %artifact.path.display(),
            "Wrote comfort classes"
        );
    }
    for failed in &summary.failed_passes {
        warn!(run = label, period = %failed.period, error = %failed.error, "Pass skipped");
    }
    if !summary.point_errors.is_empty() {
        warn!(
            run = label,
            points = summary.point_errors.len(),
            "Points left out of the classification"
        );
    }
    !summary.artifacts.is_empty()
}

fn fit_weibull(
    history: &Path,
    angles: &[f64],
    output_dir: &Path,
    seasonal: bool,
    columns: &HistoryColumns,
) -> Result<()> {
    let angles = AngleSet::new(angles).context("invalid angles")?;
    let series = read_history(history, columns)
        .with_context(|| format!("reading {}", history.display()))?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let mut annual_written = false;
    for (period, table) in fit_tables(&series, &angles, seasonal) {
        match table {
            Ok(table) => {
                let path = table
                    .write_csv(output_dir)
                    .with_context(|| format!("writing the {period} table"))?;
                info!(period = %period, path = %path.display(), "Wrote Weibull table");
                annual_written |= period == ClimatePeriod::Annual;
            }
            Err(e) => warn!(period = %period, error = %e, "No table written"),
        }
    }

    if !annual_written {
        bail!("the annual Weibull table could not be fitted");
    }
    Ok(())
}
