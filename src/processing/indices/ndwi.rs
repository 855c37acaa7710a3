// src/processing/indices/ndwi.rs
use gdal::raster::Buffer;
use rayon::prelude::*;

use crate::error::Result;
use crate::image::{band, Image};
use crate::processing::indices::{normalized_difference, IndexCalculator};
use crate::utils::gdal_ext::TypedBuffer;

/// Normalized Difference Water Index (NDWI) calculator, Gao form:
/// (NIR - SWIR) / (NIR + SWIR). On MODIS that is b02 against b05.
pub struct NDWI {
    nir: String,
    swir: String,
    name: String,
    required: [String; 2],
}

impl NDWI {
    pub fn new(nir: &str, swir: &str, name: Option<String>) -> Self {
        Self {
            nir: nir.to_string(),
            swir: swir.to_string(),
            name: name.unwrap_or_else(|| band::NDWI.to_string()),
            required: [nir.to_string(), swir.to_string()],
        }
    }
}

impl Default for NDWI {
    fn default() -> Self {
        Self::new(band::SUR_REFL_B02, band::SUR_REFL_B05, None)
    }
}

impl IndexCalculator for NDWI {
    fn calculate(&self, image: &Image) -> Result<TypedBuffer> {
        let nir_band = image.band(&self.nir)?.to_f32_vec();
        let swir_band = image.band(&self.swir)?.to_f32_vec();

        let mut result_data = vec![0.0f32; nir_band.len()];
        result_data.par_iter_mut().enumerate().for_each(|(i, result)| {
            *result = normalized_difference(nir_band[i], swir_band[i]);
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
