// src/processing/indices/mod.rs
pub mod ndi;
pub mod ndwi;
pub mod nirv;
pub mod time;

// Re-export indices
pub use ndi::NDI;
pub use ndwi::NDWI;
pub use nirv::NIRv;
pub use time::{fractional_years, ConstantBand, TimeBand};

use crate::error::Result;
use crate::image::Image;
use crate::utils::gdal_ext::TypedBuffer;

/// Computes one derived band from the bands of an image.
pub trait IndexCalculator: Send + Sync {
    fn calculate(&self, image: &Image) -> Result<TypedBuffer>;

    /// Band names that must be present on the input image.
    fn required_bands(&self) -> &[String];

    fn name(&self) -> &str;

    /// Returns `image` with the computed band appended under [`name`](Self::name).
    fn apply(&self, image: &Image) -> Result<Image> {
        image.add_band(self.name(), self.calculate(image)?)
    }
}

/// (a - b) / (a + b), NaN where the denominator is zero.
#[inline]
pub fn normalized_difference(a: f32, b: f32) -> f32 {
    let sum = a + b;
    if sum == 0.0 {
        f32::NAN
    } else {
        (a - b) / sum
    }
}

/// Appends NIRv, NDWI, NDVI and the time band `t`, casts the image to float,
/// then appends the `constant` band.
pub fn add_variables(image: &Image) -> Result<Image> {
    let derived: [&dyn IndexCalculator; 4] =
        [&NIRv::default(), &NDWI::default(), &NDI::ndvi(), &TimeBand];
    let with_indices = derived
        .iter()
        .try_fold(image.clone(), |acc, calculator| calculator.apply(&acc))?;
    ConstantBand.apply(&with_indices.to_float())
}
