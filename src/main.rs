// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vi_series::catalog::{GdalCatalog, ImageCatalog};
use vi_series::cli::{Cli, Commands};
use vi_series::config::PipelineConfig;
use vi_series::io::{read_extent, read_point_features};
use vi_series::pipeline::Pipeline;
use vi_series::presenter;
use vi_series::processing::ParallelProcessor;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if cli.float {
        config.output.float = true;
    }
    if let Some(scale_factor) = cli.scale_factor {
        config.output.scale_factor = scale_factor;
    }

    match cli.command {
        Commands::Run {
            catalog,
            points,
            boundary,
            well_ids,
            buffer,
            start,
            end,
        } => {
            if !well_ids.is_empty() {
                config.well_ids = well_ids;
            }
            if let Some(buffer) = buffer {
                config.buffer_m = buffer;
            }
            if let Some(start) = start {
                config.start = start;
            }
            if let Some(end) = end {
                config.end = end;
            }
            config.validate()?;

            let catalog = GdalCatalog::new(&config.collection, catalog, config.band_order.clone())
                .with_processor(ParallelProcessor::new(config.io_threads));
            let features = read_point_features(&points, &config.id_field)
                .with_context(|| format!("reading points {}", points.display()))?;
            let boundary = read_extent(&boundary)
                .with_context(|| format!("reading boundary {}", boundary.display()))?;

            let output = Pipeline::new(&catalog, &config).run(&features, &boundary)?;
            println!("{}", output.summary(catalog.collection_id()));

            presenter::export(
                &output,
                &cli.output,
                config.output.ratio_encoding(),
                &config.output.write_options(),
            )
            .with_context(|| format!("writing results to {}", cli.output.display()))?;
            info!(output = %cli.output.display(), "processing complete");
        }
        Commands::Inspect { catalog } => {
            let catalog = GdalCatalog::new(&config.collection, catalog, config.band_order.clone());
            let entries = catalog.entries()?;
            println!("{} ({} files)", catalog.collection_id(), entries.len());
            for entry in entries {
                let b = entry.geo.bounds();
                println!(
                    "{}  {}  {}x{}  [{:.4}, {:.4}, {:.4}, {:.4}]",
                    entry.date,
                    entry.id,
                    entry.geo.width,
                    entry.geo.height,
                    b.min_x,
                    b.min_y,
                    b.max_x,
                    b.max_y
                );
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
