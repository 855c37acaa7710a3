// src/processing/stats.rs
use tracing::debug;

use crate::error::Result;
use crate::image::band;
use crate::processing::collection::{Collection, Composite};

/// Observation counts over the query period.
#[derive(Clone)]
pub struct ObservationStats {
    pub total: Composite,
    pub clear: Composite,
    pub ratio: Composite,
}

impl ObservationStats {
    pub fn compute(observed: &Collection, cloud_masked: &Collection) -> Result<Self> {
        let total = total_obs_count(observed)?;
        let clear = clear_obs_count(cloud_masked)?;
        let ratio = clear_ratio(&clear, &total)?;
        debug!(images = observed.len(), "computed observation statistics");
        Ok(Self { total, clear, ratio })
    }
}

/// Per-pixel number of images with an observation. Never-observed pixels are masked.
pub fn total_obs_count(observed: &Collection) -> Result<Composite> {
    observed.select(&[band::NUM_OBSERVATIONS_1KM])?.count()
}

/// Per-pixel number of cloud-free observations, zero where never clear.
pub fn clear_obs_count(cloud_masked: &Collection) -> Result<Composite> {
    Ok(cloud_masked
        .select(&[band::NUM_OBSERVATIONS_1KM])?
        .count()?
        .unmask(0.0))
}

/// Fraction of observations that were clear.
pub fn clear_ratio(clear: &Composite, total: &Composite) -> Result<Composite> {
    clear.divide(total)
}
