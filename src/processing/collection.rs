// src/processing/collection.rs
use chrono::NaiveDate;
use gdal::raster::Buffer;
use itertools::Itertools;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::image::{GeoInfo, Image};
use crate::region::Bounds;

/// Images ordered by acquisition date (ties broken by id).
#[derive(Debug, Clone, Default)]
pub struct Collection {
    images: Vec<Image>,
}

impl Collection {
    pub fn new(images: Vec<Image>) -> Self {
        let images = images
            .into_iter()
            .sorted_by(|a, b| a.date().cmp(&b.date()).then_with(|| a.id().cmp(b.id())))
            .collect();
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Image> {
        self.images.iter()
    }

    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.images.first()?.date(), self.images.last()?.date()))
    }

    /// Band names of the first image; all images of a mapped collection agree.
    pub fn band_names(&self) -> Vec<String> {
        self.images
            .first()
            .map(|image| image.band_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn filter_bounds(&self, bounds: &Bounds) -> Collection {
        Collection {
            images: self
                .images
                .iter()
                .filter(|image| image.geo().bounds().intersects(bounds))
                .cloned()
                .collect(),
        }
    }

    /// Keeps images acquired in `[start, end)`.
    pub fn filter_date(&self, start: NaiveDate, end: NaiveDate) -> Collection {
        Collection {
            images: self
                .images
                .iter()
                .filter(|image| image.date() >= start && image.date() < end)
                .cloned()
                .collect(),
        }
    }

    /// Applies `f` to every image in parallel, keeping the order.
    pub fn map<F>(&self, f: F) -> Result<Collection>
    where
        F: Fn(&Image) -> Result<Image> + Send + Sync,
    {
        let images = self.images.par_iter().map(f).collect::<Result<Vec<_>>>()?;
        Ok(Collection { images })
    }

    pub fn select(&self, names: &[&str]) -> Result<Collection> {
        self.map(|image| image.select(names))
    }

    /// Per-pixel count of valid observations for each band.
    /// Pixels never observed are masked.
    pub fn count(&self) -> Result<Composite> {
        self.reduce(|values| (!values.is_empty()).then_some(values.len() as f32), false)
    }

    /// Per-pixel median of valid, non-NaN values for each band.
    pub fn median(&self) -> Result<Composite> {
        self.reduce(|values| median_of(values), true)
    }

    /// Latest valid, non-NaN value in date order for each band.
    pub fn mosaic(&self) -> Result<Composite> {
        self.reduce(|values| values.last().copied(), true)
    }

    fn reduce<R>(&self, reducer: R, skip_nan: bool) -> Result<Composite>
    where
        R: Fn(&mut Vec<f32>) -> Option<f32> + Send + Sync,
    {
        let first = self.images.first().ok_or(Error::EmptyCollection)?;
        let geo = first.geo().clone();
        let shape = geo.shape();
        for image in &self.images {
            if image.shape() != shape {
                return Err(Error::ShapeMismatch {
                    expected: shape,
                    actual: image.shape(),
                });
            }
        }

        let band_names = self.band_names();
        let mut bands = Vec::with_capacity(band_names.len());
        let mut mask = vec![false; shape.0 * shape.1];
        for name in band_names {
            let stacks = self
                .images
                .iter()
                .map(|image| Ok((image.band(&name)?.to_f32_vec(), image.mask())))
                .collect::<Result<Vec<_>>>()?;

            let pixels: Vec<Option<f32>> = (0..mask.len())
                .into_par_iter()
                .map(|i| {
                    let mut values: Vec<f32> = stacks
                        .iter()
                        .filter(|(data, valid)| valid[i] && !(skip_nan && data[i].is_nan()))
                        .map(|(data, _)| data[i])
                        .collect();
                    reducer(&mut values)
                })
                .collect();

            let data = pixels
                .iter()
                .zip(mask.iter_mut())
                .map(|(pixel, valid)| {
                    *valid |= pixel.is_some();
                    pixel.unwrap_or(f32::NAN)
                })
                .collect();
            bands.push((name, Buffer::new(shape, data)));
        }

        Ok(Composite { geo, bands, mask })
    }
}

impl IntoIterator for Collection {
    type Item = Image;
    type IntoIter = std::vec::IntoIter<Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

fn median_of(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Per-pixel reduction of a collection: float bands and one validity mask.
#[derive(Clone)]
pub struct Composite {
    geo: GeoInfo,
    bands: Vec<(String, Buffer<f32>)>,
    mask: Vec<bool>,
}

impl Composite {
    pub fn new(geo: GeoInfo, bands: Vec<(String, Buffer<f32>)>, mask: Vec<bool>) -> Result<Self> {
        let shape = geo.shape();
        if mask.len() != shape.0 * shape.1 {
            return Err(Error::ShapeMismatch {
                expected: shape,
                actual: (mask.len(), 1),
            });
        }
        if let Some((_, data)) = bands.iter().find(|(_, data)| data.shape() != shape) {
            return Err(Error::ShapeMismatch {
                expected: shape,
                actual: data.shape(),
            });
        }
        Ok(Self { geo, bands, mask })
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

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|(name, _)| name.as_str())
    }

    pub fn band(&self, name: &str) -> Result<&[f32]> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.data())
            .ok_or_else(|| Error::MissingBand {
                image: "composite".to_string(),
                band: name.to_string(),
            })
    }

    /// Pixel value, or `None` when masked.
    pub fn value(&self, name: &str, i: usize) -> Result<Option<f32>> {
        let data = self.band(name)?;
        Ok(self.mask[i].then(|| data[i]))
    }

    pub fn select(&self, names: &[&str]) -> Result<Composite> {
        let bands = names
            .iter()
            .map(|&name| {
                let data = self.band(name)?.to_vec();
                Ok((name.to_string(), Buffer::new(self.shape(), data)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Composite {
            geo: self.geo.clone(),
            bands,
            mask: self.mask.clone(),
        })
    }

    /// Fills masked pixels with `value` and marks every pixel valid.
    pub fn unmask(&self, value: f32) -> Composite {
        let bands = self
            .bands
            .iter()
            .map(|(name, data)| {
                let filled = data
                    .data()
                    .iter()
                    .zip(&self.mask)
                    .map(|(&v, &valid)| if valid { v } else { value })
                    .collect();
                (name.clone(), Buffer::new(self.shape(), filled))
            })
            .collect();
        Composite {
            geo: self.geo.clone(),
            bands,
            mask: vec![true; self.mask.len()],
        }
    }

    /// Band-wise float division; NaN where the divisor is zero.
    /// Bands are paired by position, the output keeps this composite's names.
    pub fn divide(&self, divisor: &Composite) -> Result<Composite> {
        if divisor.shape() != self.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                actual: divisor.shape(),
            });
        }
        let bands = self
            .bands
            .iter()
            .zip(&divisor.bands)
            .map(|((name, num), (_, den))| {
                let data = num
                    .data()
                    .iter()
                    .zip(den.data())
                    .map(|(&n, &d)| if d == 0.0 { f32::NAN } else { n / d })
                    .collect();
                (name.clone(), Buffer::new(self.shape(), data))
            })
            .collect();
        let mask = self
            .mask
            .iter()
            .zip(&divisor.mask)
            .map(|(&a, &b)| a && b)
            .collect();
        Ok(Composite {
            geo: self.geo.clone(),
            bands,
            mask,
        })
    }
}
