// src/processing/indices/ndi.rs
use gdal::raster::Buffer;
use rayon::prelude::*;

use crate::error::Result;
use crate::image::{band, Image};
use crate::processing::indices::{normalized_difference, IndexCalculator};
use crate::utils::gdal_ext::TypedBuffer;

/// Normalized Difference Index (NDI) calculator: (A - B) / (A + B)
pub struct NDI {
    band_a: String,
    band_b: String,
    name: String,
    required: [String; 2],
}

impl NDI {
    pub fn new(band_a: &str, band_b: &str, name: Option<String>) -> Self {
        Self {
            band_a: band_a.to_string(),
            band_b: band_b.to_string(),
            name: name.unwrap_or_else(|| "NDI".to_string()),
            required: [band_a.to_string(), band_b.to_string()],
        }
    }

    /// NDVI from MODIS NIR (b02) and red (b01).
    pub fn ndvi() -> Self {
        Self::new(band::SUR_REFL_B02, band::SUR_REFL_B01, Some(band::NDVI.to_string()))
    }
}

impl IndexCalculator for NDI {
    fn calculate(&self, image: &Image) -> Result<TypedBuffer> {
        let a_data = image.band(&self.band_a)?.to_f32_vec();
        let b_data = image.band(&self.band_b)?.to_f32_vec();

        let mut result_data = vec![0.0f32; a_data.len()];
        result_data.par_iter_mut().enumerate().for_each(|(i, result)| {
            *result = normalized_difference(a_data[i], b_data[i]);
        });

        Ok(TypedBuffer::F32(Buffer::new(image.shape(), result_data)))
    }

    fn required_bands(&self) -> &[String] {
        &self.required
    }

    fn name(&self) -> &str {
        &self.name
    }
}
