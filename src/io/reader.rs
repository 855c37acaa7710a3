// src/io/reader.rs
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gdal::{Dataset, Metadata};
use tracing::debug;

use crate::error::{Error, Result};
use crate::image::{GeoInfo, Image};
use crate::utils::gdal_ext::TypedBuffer;

/// A raster file in the catalog directory, known from its header only.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub path: PathBuf,
    pub id: String,
    pub date: NaiveDate,
    pub geo: GeoInfo,
}

impl CatalogEntry {
    /// Reads the header of `path` and the acquisition date from its name.
    pub fn open(path: &Path) -> Result<Self> {
        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let date = parse_acquisition_date(&id).ok_or_else(|| Error::UnknownDate(id.clone()))?;
        let dataset = Dataset::open(path)?;
        let geo = read_geo_info(&dataset)?;
        Ok(Self {
            path: path.to_path_buf(),
            id,
            date,
            geo,
        })
    }
}

pub fn read_geo_info(dataset: &Dataset) -> Result<GeoInfo> {
    let (width, height) = dataset.raster_size();
    Ok(GeoInfo {
        projection: dataset.projection(),
        geo_transform: dataset.geo_transform()?,
        width,
        height,
    })
}

/// Acquisition date from a file stem.
///
/// Accepts a trailing `YYYY_MM_DD` (asset ids such as `MOD09GA_2010_01_01`),
/// a trailing `YYYY-MM-DD`, or a MODIS granule token `AYYYYDDD`
/// (`MOD09GA.A2010001.h21v09.061`).
pub fn parse_acquisition_date(stem: &str) -> Option<NaiveDate> {
    if let Some(tail) = stem.get(stem.len().saturating_sub(10)..) {
        for format in ["%Y_%m_%d", "%Y-%m-%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(tail, format) {
                return Some(date);
            }
        }
    }

    stem.split('.').find_map(|token| {
        let digits = token.strip_prefix('A')?;
        if digits.len() != 7 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year = digits[..4].parse().ok()?;
        let ordinal = digits[4..].parse().ok()?;
        NaiveDate::from_yo_opt(year, ordinal)
    })
}

/// Reads every band of `dataset` into an [`Image`].
///
/// Bands are named by their description, or by position in `band_order`
/// when the description is empty. Pixels equal to a band's nodata value
/// start out masked.
pub fn read_image(dataset: &Dataset, entry: &CatalogEntry, band_order: &[String]) -> Result<Image> {
    let geo = read_geo_info(dataset)?;
    let mut image = Image::new(entry.id.clone(), entry.date, geo);
    let mut valid = vec![true; image.mask().len()];

    let band_count = dataset.raster_count() as usize;
    for index in 1..=band_count {
        let band = dataset.rasterband(index)?;
        let name = match band.description() {
            Ok(description) if !description.trim().is_empty() => description,
            _ => band_order
                .get(index - 1)
                .cloned()
                .unwrap_or_else(|| format!("b{index}")),
        };
        let data = TypedBuffer::read_band(&band)?;
        if let Some(nodata) = band.no_data_value() {
            for (i, keep) in valid.iter_mut().enumerate() {
                if data.value_f64(i) == nodata {
                    *keep = false;
                }
            }
        }
        image = image.with_band(name, data)?;
    }

    debug!(id = %entry.id, bands = band_count, "read image");
    image.update_mask(&valid)
}
