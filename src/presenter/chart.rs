// src/presenter/chart.rs
use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::image::{band, Image};
use crate::processing::collection::Collection;
use crate::processing::indices::fractional_years;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub title: String,
    pub chart_type: String,
    pub bands: Vec<String>,
    pub line_width: u32,
    pub point_size: u32,
    /// Series index the trendline is fitted to.
    pub trendline_series: usize,
    pub trendline_color: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: "Vegetation Indices Time Series at ROI".to_string(),
            chart_type: "ScatterChart".to_string(),
            bands: vec![
                band::NDWI.to_string(),
                band::NDVI.to_string(),
                band::NIRV.to_string(),
            ],
            line_width: 1,
            point_size: 3,
            trendline_series: 0,
            trendline_color: "CC0000".to_string(),
        }
    }
}

/// Band values of one acquisition at the sampled points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub t: f64,
    pub values: BTreeMap<String, f64>,
}

/// Ordinary least squares fit `y = intercept + slope * t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trendline {
    pub series: String,
    pub color: String,
    pub fit: LinearFit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesChart {
    pub title: String,
    pub chart_type: String,
    pub series: Vec<String>,
    pub line_width: u32,
    pub point_size: u32,
    pub points: Vec<SeriesPoint>,
    pub trendlines: Vec<Trendline>,
}

impl TimeSeriesChart {
    pub fn build(collection: &Collection, points: &[(f64, f64)], options: &ChartOptions) -> Result<Self> {
        let samples = sample_series(collection, points, &options.bands)?;

        let trendlines = options
            .bands
            .get(options.trendline_series)
            .and_then(|series| {
                let (ts, ys): (Vec<f64>, Vec<f64>) =
                    series_values(&samples, series).into_iter().unzip();
                fit_linear_trend(&ts, &ys).map(|fit| Trendline {
                    series: series.clone(),
                    color: options.trendline_color.clone(),
                    fit,
                })
            })
            .into_iter()
            .collect();

        Ok(Self {
            title: options.title.clone(),
            chart_type: options.chart_type.clone(),
            series: options.bands.clone(),
            line_width: options.line_width,
            point_size: options.point_size,
            points: samples,
            trendlines,
        })
    }
}

/// Values of one series as `(t, value)` pairs.
fn series_values(points: &[SeriesPoint], name: &str) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|p| p.values.get(name).map(|&v| (p.t, v)))
        .collect()
}

/// Mean of each band over the pixels containing `points`, per image.
///
/// Masked and NaN pixels are ignored; a band with no usable pixel is left out
/// of that image's values, and images with no values at all are dropped.
pub fn sample_series(collection: &Collection, points: &[(f64, f64)], bands: &[String]) -> Result<Vec<SeriesPoint>> {
    let mut samples = Vec::with_capacity(collection.len());
    for image in collection.iter() {
        let pixels: Vec<usize> = points
            .iter()
            .filter_map(|&(x, y)| image.geo().pixel_at(x, y))
            .unique()
            .map(|(col, row)| row * image.geo().width + col)
            .collect();

        let mut values = BTreeMap::new();
        for name in bands {
            if let Some(mean) = mean_at(image, name, &pixels)? {
                values.insert(name.clone(), mean);
            }
        }
        if values.is_empty() {
            continue;
        }
        samples.push(SeriesPoint {
            date: image.date(),
            t: image_time(image, &pixels)?,
            values,
        });
    }
    Ok(samples)
}

fn mean_at(image: &Image, name: &str, pixels: &[usize]) -> Result<Option<f64>> {
    let data = image.band(name)?;
    let valid: Vec<f64> = pixels
        .iter()
        .filter(|&&i| image.is_valid(i))
        .map(|&i| data.value_f64(i))
        .filter(|v| !v.is_nan())
        .collect();
    Ok((!valid.is_empty()).then(|| valid.iter().sum::<f64>() / valid.len() as f64))
}

/// The image's `t` band when present, otherwise derived from its date.
fn image_time(image: &Image, pixels: &[usize]) -> Result<f64> {
    if image.has_band(band::T) {
        if let Some(&i) = pixels.first() {
            return Ok(image.band(band::T)?.value_f64(i));
        }
    }
    Ok(fractional_years(image.date()))
}

/// Least squares line through `(xs, ys)`; `None` with fewer than two points
/// or when every x is equal.
pub fn fit_linear_trend(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let (sxx, sxy) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxx, sxy), (&x, &y)| {
            let dx = x - mean_x;
            (sxx + dx * dx, sxy + dx * (y - mean_y))
        });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let (ss_res, ss_tot) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(res, tot), (&x, &y)| {
            let e = y - (intercept + slope * x);
            (res + e * e, tot + (y - mean_y).powi(2))
        });
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        n,
    })
}
