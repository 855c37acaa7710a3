// src/presenter/mod.rs
pub mod chart;
pub mod layers;

pub use chart::{fit_linear_trend, ChartOptions, LinearFit, TimeSeriesChart};
pub use layers::{default_layers, render, LayerDef, LayerSource, MapView, VisParams};

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::io::writer::{write_composite, write_rgba, Encoding, WriteOptions};
use crate::pipeline::PipelineOutput;
use crate::processing::collection::Composite;

/// Writes the layers of `output` to `dir` along with `map.json` and `chart.json`.
///
/// `ratio_encoding` applies to the clear ratio layer; counts and reflectance
/// composites are always written as float32.
pub fn export(
    output: &PipelineOutput,
    dir: &Path,
    ratio_encoding: Encoding,
    options: &WriteOptions,
) -> Result<()> {
    fs::create_dir_all(dir)?;

    for layer in &output.map.layers {
        let Some(stem) = layer.source.file_stem() else {
            continue;
        };
        let Some(composite) = layer_composite(output, layer.source) else {
            continue;
        };
        let encoding = match layer.source {
            LayerSource::ClearRatio => ratio_encoding,
            _ => Encoding::Float32,
        };
        write_composite(composite, &dir.join(format!("{stem}.tif")), encoding, options)?;

        let rgba = render(composite, &layer.vis)?;
        write_rgba(
            &rgba,
            composite.geo(),
            &dir.join(format!("{stem}_quicklook.tif")),
            options,
        )?;
    }

    fs::write(dir.join("map.json"), serde_json::to_string_pretty(&output.map)?)?;
    fs::write(dir.join("chart.json"), serde_json::to_string_pretty(&output.chart)?)?;
    info!(dir = %dir.display(), layers = output.map.layers.len(), "exported results");
    Ok(())
}

fn layer_composite(output: &PipelineOutput, source: LayerSource) -> Option<&Composite> {
    match source {
        LayerSource::NirvMosaic => Some(&output.nirv_mosaic),
        LayerSource::Roi => None,
        LayerSource::Median => Some(&output.median),
        LayerSource::TotalObsCount => Some(&output.stats.total),
        LayerSource::ClearObsCount => Some(&output.stats.clear),
        LayerSource::ClearRatio => Some(&output.stats.ratio),
    }
}
