// src/processing/masks.rs
use crate::error::Result;
use crate::image::{band, Image};

/// Bit 10 of `state_1km`: the internal cloud algorithm flag.
pub const INTERNAL_CLOUD_FLAG_BIT: u32 = 10;
pub const INTERNAL_CLOUD_FLAG_MASK: i64 = 1 << INTERNAL_CLOUD_FLAG_BIT;

/// Masks out pixels that had no observations (`num_observations_1km <= 0`).
pub fn mask_empty_pixels(image: &Image) -> Result<Image> {
    let observations = image.band(band::NUM_OBSERVATIONS_1KM)?;
    let with_obs: Vec<bool> = (0..observations.len())
        .map(|i| observations.value_f64(i) > 0.0)
        .collect();
    image.update_mask(&with_obs)
}

/// Masks out pixels whose internal cloud algorithm flag is set.
pub fn mask_clouds(image: &Image) -> Result<Image> {
    let qa = image.band(band::STATE_1KM)?;
    let clear: Vec<bool> = (0..qa.len())
        .map(|i| (qa.value_i64(i) & INTERNAL_CLOUD_FLAG_MASK) == 0)
        .collect();
    image.update_mask(&clear)
}
