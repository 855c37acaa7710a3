// src/pipeline.rs
use std::fmt;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::catalog::ImageCatalog;
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::image::band;
use crate::presenter::{MapView, TimeSeriesChart};
use crate::processing::collection::{Collection, Composite};
use crate::processing::indices::add_variables;
use crate::processing::masks::{mask_clouds, mask_empty_pixels};
use crate::processing::stats::ObservationStats;
use crate::region::{select_region, Bounds, PointFeature, Region};

/// Everything a run produces, before it is written out.
pub struct PipelineOutput {
    pub region: Region,
    /// Observation-masked collection.
    pub observed: Collection,
    /// Observation- and cloud-masked collection.
    pub cloud_masked: Collection,
    /// Cloud-masked collection with the derived index bands.
    pub indexed: Collection,
    pub stats: ObservationStats,
    pub median: Composite,
    pub nirv_mosaic: Composite,
    pub chart: TimeSeriesChart,
    pub map: MapView,
}

impl PipelineOutput {
    pub fn summary(&self, collection_id: &str) -> CollectionSummary {
        CollectionSummary::new(collection_id, &self.indexed)
    }
}

/// Printable description of a collection: id, size, date span and bands.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSummary {
    pub id: String,
    pub images: usize,
    pub span: Option<(NaiveDate, NaiveDate)>,
    pub bands: Vec<String>,
}

impl CollectionSummary {
    pub fn new(id: &str, collection: &Collection) -> Self {
        Self {
            id: id.to_string(),
            images: collection.len(),
            span: collection.date_span(),
            bands: collection.band_names(),
        }
    }
}

impl fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageCollection {} ({} elements", self.id, self.images)?;
        if let Some((first, last)) = self.span {
            write!(f, ", {first} to {last}")?;
        }
        write!(f, ")")?;
        if !self.bands.is_empty() {
            write!(f, "\n  bands: {}", self.bands.join(", "))?;
        }
        Ok(())
    }
}

pub struct Pipeline<'a> {
    catalog: &'a dyn ImageCatalog,
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(catalog: &'a dyn ImageCatalog, config: &'a PipelineConfig) -> Self {
        Self { catalog, config }
    }

    /// Selects the region from `features`, queries the catalog within
    /// `boundary`, masks, derives indices and builds the chart and map.
    pub fn run(&self, features: &[PointFeature], boundary: &Bounds) -> Result<PipelineOutput> {
        let config = self.config;

        let region = select_region(features, &config.well_ids, config.buffer_m);
        if region.is_empty() {
            return Err(Error::NoMatchingFeatures {
                field: config.id_field.clone(),
                ids: config.well_ids.clone(),
            });
        }
        info!(features = region.len(), buffer_m = config.buffer_m, "selected region");

        let raw = self.catalog.query(boundary, config.start, config.end)?;
        info!(
            collection = self.catalog.collection_id(),
            images = raw.len(),
            start = %config.start,
            end = %config.end,
            "queried catalog"
        );
        if raw.is_empty() {
            return Err(Error::EmptyCollection);
        }
        if let Some(region_bounds) = region.bounds() {
            if !region_bounds.intersects(boundary) {
                warn!("region lies outside the query boundary");
            }
        }

        let observed = raw.map(mask_empty_pixels)?;
        let cloud_masked = observed.map(mask_clouds)?;
        let stats = ObservationStats::compute(&observed, &cloud_masked)?;
        info!("computed observation counts");

        let indexed = cloud_masked.map(add_variables)?;
        let median = cloud_masked.median()?;
        let nirv_mosaic = indexed.select(&[band::NIRV])?.mosaic()?;

        let chart = TimeSeriesChart::build(&indexed, &region.points(), &config.chart)?;
        info!(
            samples = chart.points.len(),
            trendlines = chart.trendlines.len(),
            "built time series chart"
        );

        let map = MapView::new(&region, config.zoom, &config.layers);

        Ok(PipelineOutput {
            region,
            observed,
            cloud_masked,
            indexed,
            stats,
            median,
            nirv_mosaic,
            chart,
            map,
        })
    }
}
