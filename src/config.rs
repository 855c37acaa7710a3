// src/config.rs
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::band;
use crate::io::writer::{Encoding, WriteOptions};
use crate::presenter::{default_layers, ChartOptions, LayerDef};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_well_ids")]
    pub well_ids: Vec<String>,
    /// Buffer radius around each selected point, in meters.
    #[serde(default = "default_buffer_m")]
    pub buffer_m: f64,
    #[serde(default = "default_start")]
    pub start: NaiveDate,
    /// Exclusive end of the query period.
    #[serde(default = "default_end")]
    pub end: NaiveDate,
    /// Band names for files whose bands carry no description.
    #[serde(default = "default_band_order")]
    pub band_order: Vec<String>,
    #[serde(default)]
    pub io_threads: Option<usize>,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default)]
    pub chart: ChartOptions,
    #[serde(default = "default_layers")]
    pub layers: Vec<LayerDef>,
    #[serde(default)]
    pub output: OutputParams,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct OutputParams {
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default = "default_compress_level")]
    pub compress_level: u8,
    #[serde(default)]
    pub float: bool,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: i32,
    #[serde(default = "default_true")]
    pub tiled: bool,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            compress: default_compress(),
            compress_level: default_compress_level(),
            float: false,
            scale_factor: default_scale_factor(),
            tiled: default_true(),
        }
    }
}

impl OutputParams {
    pub fn ratio_encoding(&self) -> Encoding {
        if self.float {
            Encoding::Float32
        } else {
            Encoding::FixedPoint {
                scale_factor: self.scale_factor,
            }
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            compress: self.compress.clone(),
            compress_level: self.compress_level,
            tiled: self.tiled,
        }
    }
}

fn default_collection() -> String {
    "MODIS/006/MOD09GA".to_string()
}

fn default_id_field() -> String {
    "Well_id".to_string()
}

fn default_well_ids() -> Vec<String> {
    vec!["B22C0567-001".to_string()]
}

fn default_buffer_m() -> f64 {
    1000.0
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or_default()
}

fn default_band_order() -> Vec<String> {
    band::DEFAULT_ORDER.iter().map(|b| b.to_string()).collect()
}

fn default_zoom() -> u8 {
    11
}

fn default_compress() -> String {
    "DEFLATE".to_string()
}

fn default_compress_level() -> u8 {
    6
}

fn default_scale_factor() -> i32 {
    10000
}

fn default_true() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            id_field: default_id_field(),
            well_ids: default_well_ids(),
            buffer_m: default_buffer_m(),
            start: default_start(),
            end: default_end(),
            band_order: default_band_order(),
            io_threads: None,
            zoom: default_zoom(),
            chart: ChartOptions::default(),
            layers: default_layers(),
            output: OutputParams::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start >= self.end {
            return Err(Error::InvalidParameter {
                name: "end",
                value: self.end.to_string(),
                reason: format!("must be after start {}", self.start),
            });
        }
        if !(self.buffer_m.is_finite() && self.buffer_m >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "buffer_m",
                value: self.buffer_m.to_string(),
                reason: "must be a non-negative distance in meters".to_string(),
            });
        }
        if self.output.scale_factor <= 0 || self.output.scale_factor > i16::MAX as i32 {
            return Err(Error::InvalidParameter {
                name: "scale_factor",
                value: self.output.scale_factor.to_string(),
                reason: format!("must be in 1..={} to fit int16 output", i16::MAX),
            });
        }
        Ok(())
    }
}
