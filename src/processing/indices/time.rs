// src/processing/indices/time.rs
use chrono::NaiveDate;

use crate::error::Result;
use crate::image::{band, Image};
use crate::processing::indices::IndexCalculator;
use crate::utils::gdal_ext::TypedBuffer;

/// Mean calendar year length used for fractional years.
pub const DAYS_PER_YEAR: f64 = 365.25;

pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Years elapsed since 1970-01-01, counting 365.25 days per year.
pub fn fractional_years(date: NaiveDate) -> f64 {
    (date - epoch()).num_days() as f64 / DAYS_PER_YEAR
}

/// Constant band `t` holding the image's fractional year.
#[derive(Default)]
pub struct TimeBand;

impl IndexCalculator for TimeBand {
    fn calculate(&self, image: &Image) -> Result<TypedBuffer> {
        Ok(TypedBuffer::filled_f32(
            image.shape(),
            fractional_years(image.date()) as f32,
        ))
    }

    fn required_bands(&self) -> &[String] {
        &[]
    }

    fn name(&self) -> &str {
        band::T
    }
}

/// Band of ones, the intercept term for trend fitting.
#[derive(Default)]
pub struct ConstantBand;

impl IndexCalculator for ConstantBand {
    fn calculate(&self, image: &Image) -> Result<TypedBuffer> {
        Ok(TypedBuffer::filled_i32(image.shape(), 1))
    }

    fn required_bands(&self) -> &[String] {
        &[]
    }

    fn name(&self) -> &str {
        band::CONSTANT
    }
}
