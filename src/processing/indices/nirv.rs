// src/processing/indices/nirv.rs
use gdal::raster::Buffer;
use rayon::prelude::*;

use crate::error::Result;
use crate::image::{band, Image};
use crate::processing::indices::{normalized_difference, IndexCalculator};
use crate::utils::gdal_ext::TypedBuffer;

/// MOD09GA reflectance scale: stored value 10000 is reflectance 1.0.
pub const REFLECTANCE_SCALE: f32 = 10000.0;

/// Near-Infrared Reflectance of vegetation: NDVI * NIR.
pub struct NIRv {
    nir: String,
    red: String,
    name: String,
    required: [String; 2],
}

impl NIRv {
    pub fn new(nir: &str, red: &str, name: Option<String>) -> Self {
        Self {
            nir: nir.to_string(),
            red: red.to_string(),
            name: name.unwrap_or_else(|| band::NIRV.to_string()),
            required: [nir.to_string(), red.to_string()],
        }
    }
}

impl Default for NIRv {
    fn default() -> Self {
        Self::new(band::SUR_REFL_B02, band::SUR_REFL_B01, None)
    }
}

impl IndexCalculator for NIRv {
    fn calculate(&self, image: &Image) -> Result<TypedBuffer> {
        let nir_band = image.band(&self.nir)?.to_f32_vec();
        let red_band = image.band(&self.red)?.to_f32_vec();

        let mut result_data = vec![0.0f32; nir_band.len()];
        result_data.par_iter_mut().enumerate().for_each(|(i, result)| {
            let nir_val = nir_band[i];
            *result = normalized_difference(nir_val, red_band[i]) * nir_val / REFLECTANCE_SCALE;
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
