// src/cli.rs
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vi-series")]
#[command(about = "Vegetation index time series from MODIS surface reflectance")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON pipeline configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "output", global = true)]
    pub output: PathBuf,

    /// Write the clear ratio as float32 instead of int16
    #[arg(long, global = true)]
    pub float: bool,

    /// Scaling factor for fixed-point output
    #[arg(long, global = true)]
    pub scale_factor: Option<i32>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mask the collection, derive NDVI, NIRv and NDWI, and write layers and chart
    Run {
        /// Directory with one GeoTIFF per acquisition
        #[arg(long)]
        catalog: PathBuf,

        /// Point dataset holding the well locations
        #[arg(short = 'p', long)]
        points: PathBuf,

        /// Boundary dataset bounding the catalog query
        #[arg(short = 'b', long)]
        boundary: PathBuf,

        /// Well id to select (repeatable)
        #[arg(short = 'w', long = "well-id")]
        well_ids: Vec<String>,

        /// Buffer radius around each well, in meters
        #[arg(long)]
        buffer: Option<f64>,

        /// First acquisition date (inclusive)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last acquisition date (exclusive)
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// List the acquisitions found in a catalog directory
    Inspect {
        /// Directory with one GeoTIFF per acquisition
        #[arg(long)]
        catalog: PathBuf,
    },
}
