//! Metrics CSV export
//!
//! Dumps every country-year record of the dataset as one flat CSV, the
//! input format of the forecasting job.
//!
//! Usage:
//!   export-metrics --dataset data/atlas.json --out ml/data_proc/combined.csv

use anyhow::{Context, Result};
use clap::Parser;
use map_data::{write_metrics_csv, JsonFileStore};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "export-metrics",
    about = "Export all country-year indicator values to CSV"
)]
struct Args {
    /// Path to the dataset JSON file
    #[arg(short, long, default_value = "data/atlas.json")]
    dataset: PathBuf,

    /// Output CSV file
    #[arg(short, long, default_value = "ml/data_proc/combined.csv")]
    out: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }

    let store = JsonFileStore::new(&args.dataset);
    let file = File::create(&args.out).with_context(|| format!("creating {:?}", args.out))?;
    let rows = write_metrics_csv(&store, BufWriter::new(file))?;

    info!("Wrote {} rows to {:?}", rows, args.out);
    Ok(())
}
