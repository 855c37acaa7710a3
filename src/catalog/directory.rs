// src/catalog/directory.rs
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::catalog::ImageCatalog;
use crate::error::Result;
use crate::io::reader::CatalogEntry;
use crate::processing::collection::Collection;
use crate::processing::parallel::ParallelProcessor;
use crate::region::Bounds;

const RASTER_EXTENSIONS: [&str; 3] = ["tif", "tiff", "vrt"];

/// Catalog backed by a directory holding one raster per acquisition.
pub struct GdalCatalog {
    id: String,
    root: PathBuf,
    band_order: Vec<String>,
    processor: ParallelProcessor,
}

impl GdalCatalog {
    pub fn new(id: impl Into<String>, root: impl Into<PathBuf>, band_order: Vec<String>) -> Self {
        Self {
            id: id.into(),
            root: root.into(),
            band_order,
            processor: ParallelProcessor::new(None),
        }
    }

    pub fn with_processor(mut self, processor: ParallelProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Headers of every dated raster in the directory, in date order.
    /// Files without a recognisable date or that GDAL cannot open are skipped.
    pub fn entries(&self) -> Result<Vec<CatalogEntry>> {
        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            let is_raster = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| RASTER_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
            if !is_raster {
                continue;
            }
            match CatalogEntry::open(&path) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping catalog file"),
            }
        }
        Ok(entries
            .into_iter()
            .sorted_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)))
            .collect())
    }
}

impl ImageCatalog for GdalCatalog {
    fn collection_id(&self) -> &str {
        &self.id
    }

    fn query(&self, bounds: &Bounds, start: NaiveDate, end: NaiveDate) -> Result<Collection> {
        let entries = self.entries()?;
        let scanned = entries.len();
        let matched: Vec<CatalogEntry> = entries
            .into_iter()
            .filter(|entry| entry.date >= start && entry.date < end)
            .filter(|entry| entry.geo.bounds().intersects(bounds))
            .collect();
        debug!(scanned, matched = matched.len(), "filtered catalog headers");

        let images = self.processor.read_images(matched, &self.band_order)?;
        info!(
            collection = %self.id,
            images = images.len(),
            io_threads = self.processor.io_threads(),
            "loaded collection"
        );
        Ok(Collection::new(images))
    }
}
