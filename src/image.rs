// src/image.rs
use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::region::Bounds;
use crate::utils::gdal_ext::TypedBuffer;

/// Band names of the MOD09GA daily surface reflectance product, plus the
/// bands derived from it.
pub mod band {
    pub const SUR_REFL_B01: &str = "sur_refl_b01";
    pub const SUR_REFL_B02: &str = "sur_refl_b02";
    pub const SUR_REFL_B03: &str = "sur_refl_b03";
    pub const SUR_REFL_B04: &str = "sur_refl_b04";
    pub const SUR_REFL_B05: &str = "sur_refl_b05";
    pub const SUR_REFL_B06: &str = "sur_refl_b06";
    pub const SUR_REFL_B07: &str = "sur_refl_b07";
    pub const NUM_OBSERVATIONS_1KM: &str = "num_observations_1km";
    pub const STATE_1KM: &str = "state_1km";

    pub const NDVI: &str = "NDVI";
    pub const NIRV: &str = "NIRv";
    pub const NDWI: &str = "NDWI";
    pub const T: &str = "t";
    pub const CONSTANT: &str = "constant";

    /// Storage order assumed for files whose bands carry no description.
    pub const DEFAULT_ORDER: [&str; 7] = [
        SUR_REFL_B01,
        SUR_REFL_B02,
        SUR_REFL_B03,
        SUR_REFL_B04,
        SUR_REFL_B05,
        NUM_OBSERVATIONS_1KM,
        STATE_1KM,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

impl GeoInfo {
    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let gt = &self.geo_transform;
        let px = col as f64 + 0.5;
        let py = row as f64 + 0.5;
        (
            gt[0] + px * gt[1] + py * gt[2],
            gt[3] + px * gt[4] + py * gt[5],
        )
    }

    /// Pixel containing `(x, y)`, for north-up grids.
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let gt = &self.geo_transform;
        if gt[1] == 0.0 || gt[5] == 0.0 {
            return None;
        }
        let col = ((x - gt[0]) / gt[1]).floor();
        let row = ((y - gt[3]) / gt[5]).floor();
        if col < 0.0 || row < 0.0 || col >= self.width as f64 || row >= self.height as f64 {
            return None;
        }
        Some((col as usize, row as usize))
    }

    pub fn bounds(&self) -> Bounds {
        let gt = &self.geo_transform;
        let corners = [
            (0.0, 0.0),
            (self.width as f64, 0.0),
            (0.0, self.height as f64),
            (self.width as f64, self.height as f64),
        ]
        .map(|(px, py)| (gt[0] + px * gt[1] + py * gt[2], gt[3] + px * gt[4] + py * gt[5]));
        Bounds::from_points(corners.iter().copied())
            .unwrap_or_else(|| Bounds::new(gt[0], gt[3], gt[0], gt[3]))
    }
}

/// One acquisition: co-registered named bands sharing a validity mask.
#[derive(Debug, Clone)]
pub struct Image {
    id: String,
    date: NaiveDate,
    geo: GeoInfo,
    bands: Vec<(String, TypedBuffer)>,
    mask: Vec<bool>,
}

impl Image {
    pub fn new(id: impl Into<String>, date: NaiveDate, geo: GeoInfo) -> Self {
        let mask = vec![true; geo.width * geo.height];
        Self {
            id: id.into(),
            date,
            geo,
            bands: Vec::new(),
            mask,
        }
    }

    /// Builder form of [`Image::add_band`].
    pub fn with_band(mut self, name: impl Into<String>, data: TypedBuffer) -> Result<Self> {
        self.insert_band(name.into(), data)?;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn geo(&self) -> &GeoInfo {
        &self.geo
    }

    pub fn shape(&self) -> (usize, usize) {
        self.geo.shape()
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_valid(&self, i: usize) -> bool {
        self.mask[i]
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|(name, _)| name.as_str())
    }

    pub fn bands(&self) -> impl Iterator<Item = (&str, &TypedBuffer)> {
        self.bands.iter().map(|(name, data)| (name.as_str(), data))
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|(n, _)| n == name)
    }

    pub fn band(&self, name: &str) -> Result<&TypedBuffer> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
            .ok_or_else(|| Error::MissingBand {
                image: self.id.clone(),
                band: name.to_string(),
            })
    }

    /// Pixel value, or `None` when the pixel is masked.
    pub fn value(&self, name: &str, i: usize) -> Result<Option<f64>> {
        let data = self.band(name)?;
        Ok(self.mask[i].then(|| data.value_f64(i)))
    }

    /// Returns a copy whose mask is the intersection of the current mask and `valid`.
    pub fn update_mask(&self, valid: &[bool]) -> Result<Image> {
        if valid.len() != self.mask.len() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                actual: (valid.len(), 1),
            });
        }
        let mut image = self.clone();
        image
            .mask
            .iter_mut()
            .zip(valid)
            .for_each(|(current, &keep)| *current = *current && keep);
        Ok(image)
    }

    /// Returns a copy with `data` appended; an existing band of that name is replaced.
    pub fn add_band(&self, name: impl Into<String>, data: TypedBuffer) -> Result<Image> {
        let mut image = self.clone();
        image.insert_band(name.into(), data)?;
        Ok(image)
    }

    pub fn select(&self, names: &[&str]) -> Result<Image> {
        let bands = names
            .iter()
            .map(|&name| Ok((name.to_string(), self.band(name)?.clone())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Image {
            id: self.id.clone(),
            date: self.date,
            geo: self.geo.clone(),
            bands,
            mask: self.mask.clone(),
        })
    }

    /// Casts every band to `f32`.
    pub fn to_float(&self) -> Image {
        let mut image = self.clone();
        for (_, data) in image.bands.iter_mut() {
            *data = data.to_f32();
        }
        image
    }

    fn insert_band(&mut self, name: String, data: TypedBuffer) -> Result<()> {
        if data.shape() != self.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                actual: data.shape(),
            });
        }
        match self.bands.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = data,
            None => self.bands.push((name, data)),
        }
        Ok(())
    }
}
