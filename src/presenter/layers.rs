// src/presenter/layers.rs
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::image::band;
use crate::processing::collection::Composite;
use crate::region::Region;

/// Display parameters of a map layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gamma: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl VisParams {
    /// Maps a raw value to display intensity in [0, 1].
    ///
    /// With `gain` the value is scaled onto 0..255 display counts; otherwise
    /// it is stretched linearly between `min` (default 0) and `max` (default 1).
    pub fn stretch(&self, value: f64) -> f64 {
        let x = match self.gain {
            Some(gain) => value * gain / 255.0,
            None => {
                let min = self.min.unwrap_or(0.0);
                let max = self.max.unwrap_or(1.0);
                if max == min {
                    if value >= max { 1.0 } else { 0.0 }
                } else {
                    (value - min) / (max - min)
                }
            }
        };
        let x = x.clamp(0.0, 1.0);
        match self.gamma {
            Some(gamma) if gamma > 0.0 => x.powf(1.0 / gamma),
            _ => x,
        }
    }

    /// Color at `x` in [0, 1] interpolated across the palette.
    pub fn palette_color(&self, x: f64) -> Result<[u8; 3]> {
        let palette = match &self.palette {
            Some(palette) if !palette.is_empty() => palette,
            _ => {
                let v = (x.clamp(0.0, 1.0) * 255.0).round() as u8;
                return Ok([v, v, v]);
            }
        };
        let colors = palette
            .iter()
            .map(|name| parse_color(name))
            .collect::<Result<Vec<_>>>()?;
        if colors.len() == 1 {
            return Ok(colors[0]);
        }
        let pos = x.clamp(0.0, 1.0) * (colors.len() - 1) as f64;
        let lower = (pos.floor() as usize).min(colors.len() - 2);
        let frac = pos - lower as f64;
        let (a, b) = (colors[lower], colors[lower + 1]);
        Ok([0usize, 1, 2].map(|c| (a[c] as f64 + (b[c] as f64 - a[c] as f64) * frac).round() as u8))
    }
}

/// Parses a CSS color name or a hex `RRGGBB` (optionally `#`-prefixed).
pub fn parse_color(name: &str) -> Result<[u8; 3]> {
    let rgb = match name.trim().to_lowercase().as_str() {
        "white" => [255, 255, 255],
        "black" => [0, 0, 0],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" => [0, 255, 255],
        "magenta" => [255, 0, 255],
        "orange" => [255, 165, 0],
        "gray" | "grey" => [128, 128, 128],
        other => {
            let hex = other.trim_start_matches('#');
            let channel = |i: usize| hex.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok());
            match (hex.len(), channel(0), channel(2), channel(4)) {
                (6, Some(r), Some(g), Some(b)) => [r, g, b],
                _ => {
                    return Err(Error::InvalidParameter {
                        name: "color",
                        value: name.to_string(),
                        reason: "expected a color name or RRGGBB hex".to_string(),
                    })
                }
            }
        }
    };
    Ok(rgb)
}

/// Renders a composite to RGBA pixels. Masked and NaN pixels are transparent.
pub fn render(composite: &Composite, vis: &VisParams) -> Result<Vec<[u8; 4]>> {
    let names: Vec<String> = match &vis.bands {
        Some(bands) => bands.clone(),
        None => composite.band_names().take(1).map(str::to_string).collect(),
    };
    let channels = names
        .iter()
        .map(|name| composite.band(name))
        .collect::<Result<Vec<_>>>()?;
    let mask = composite.mask();

    match channels.as_slice() {
        [single] => (0..mask.len())
            .map(|i| -> Result<[u8; 4]> {
                let v = single[i];
                if !mask[i] || v.is_nan() {
                    return Ok([0, 0, 0, 0]);
                }
                let [r, g, b] = vis.palette_color(vis.stretch(v as f64))?;
                Ok([r, g, b, 255])
            })
            .collect(),
        [red, green, blue] => Ok((0..mask.len())
            .map(|i| {
                let values = [red[i], green[i], blue[i]];
                if !mask[i] || values.iter().any(|v| v.is_nan()) {
                    return [0, 0, 0, 0];
                }
                let [r, g, b] = values.map(|v| (vis.stretch(v as f64) * 255.0).round() as u8);
                [r, g, b, 255]
            })
            .collect()),
        _ => Err(Error::InvalidParameter {
            name: "bands",
            value: format!("{names:?}"),
            reason: "expected one or three bands".to_string(),
        }),
    }
}

/// What a map layer displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSource {
    NirvMosaic,
    Roi,
    Median,
    TotalObsCount,
    ClearObsCount,
    ClearRatio,
}

impl LayerSource {
    /// File stem of the written raster; `None` for vector layers.
    pub fn file_stem(&self) -> Option<&'static str> {
        match self {
            LayerSource::NirvMosaic => Some("nirv_mosaic"),
            LayerSource::Roi => None,
            LayerSource::Median => Some("median"),
            LayerSource::TotalObsCount => Some("total_obs_count"),
            LayerSource::ClearObsCount => Some("clear_obs_count"),
            LayerSource::ClearRatio => Some("clear_ratio"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDef {
    pub name: String,
    pub source: LayerSource,
    #[serde(default)]
    pub vis: VisParams,
    #[serde(default = "default_shown")]
    pub shown: bool,
}

fn default_shown() -> bool {
    true
}

/// Layers shown for a vegetation index run, in drawing order.
pub fn default_layers() -> Vec<LayerDef> {
    vec![
        LayerDef {
            name: "NIRv Mosaic".to_string(),
            source: LayerSource::NirvMosaic,
            vis: VisParams {
                bands: Some(vec![band::NIRV.to_string()]),
                min: Some(0.1),
                max: Some(0.9),
                palette: Some(vec!["white".to_string(), "green".to_string()]),
                ..Default::default()
            },
            shown: true,
        },
        LayerDef {
            name: "ROI".to_string(),
            source: LayerSource::Roi,
            vis: VisParams {
                color: Some("yellow".to_string()),
                ..Default::default()
            },
            shown: true,
        },
        LayerDef {
            name: "median of masked collection".to_string(),
            source: LayerSource::Median,
            vis: VisParams {
                bands: Some(vec![
                    band::SUR_REFL_B01.to_string(),
                    band::SUR_REFL_B04.to_string(),
                    band::SUR_REFL_B03.to_string(),
                ]),
                gain: Some(0.07),
                gamma: Some(1.4),
                ..Default::default()
            },
            shown: true,
        },
        LayerDef {
            name: "count of total observations".to_string(),
            source: LayerSource::TotalObsCount,
            vis: VisParams {
                min: Some(84.0),
                max: Some(92.0),
                ..Default::default()
            },
            shown: false,
        },
        LayerDef {
            name: "count of clear observations".to_string(),
            source: LayerSource::ClearObsCount,
            vis: VisParams {
                min: Some(0.0),
                max: Some(90.0),
                ..Default::default()
            },
            shown: false,
        },
        LayerDef {
            name: "ratio of clear to total observations".to_string(),
            source: LayerSource::ClearRatio,
            vis: VisParams {
                min: Some(0.0),
                max: Some(1.0),
                ..Default::default()
            },
            shown: true,
        },
    ]
}

/// One entry of the map manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub source: LayerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quicklook: Option<String>,
    pub vis: VisParams,
    pub shown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

/// Map manifest: view center, zoom and layers in drawing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub layers: Vec<LayerSpec>,
}

impl MapView {
    pub fn new(region: &Region, zoom: u8, defs: &[LayerDef]) -> Self {
        let layers = defs
            .iter()
            .map(|def| {
                let stem = def.source.file_stem();
                LayerSpec {
                    name: def.name.clone(),
                    source: def.source,
                    file: stem.map(|s| format!("{s}.tif")),
                    quicklook: stem.map(|s| format!("{s}_quicklook.tif")),
                    vis: def.vis.clone(),
                    shown: def.shown,
                    region: (def.source == LayerSource::Roi).then(|| region.clone()),
                }
            })
            .collect();
        Self {
            center: region.centroid().unwrap_or_default(),
            zoom,
            layers,
        }
    }
}
