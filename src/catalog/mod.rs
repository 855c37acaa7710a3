// src/catalog/mod.rs
//! Read-only access to an archive of acquisitions.

pub mod directory;

pub use directory::GdalCatalog;

use chrono::NaiveDate;

use crate::error::Result;
use crate::image::Image;
use crate::processing::collection::Collection;
use crate::region::Bounds;

pub trait ImageCatalog: Send + Sync {
    fn collection_id(&self) -> &str;

    /// Images intersecting `bounds` and acquired in `[start, end)`.
    fn query(&self, bounds: &Bounds, start: NaiveDate, end: NaiveDate) -> Result<Collection>;
}

/// Catalog over images already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    id: String,
    images: Collection,
}

impl MemoryCatalog {
    pub fn new(id: impl Into<String>, images: Vec<Image>) -> Self {
        Self {
            id: id.into(),
            images: Collection::new(images),
        }
    }
}

impl ImageCatalog for MemoryCatalog {
    fn collection_id(&self) -> &str {
        &self.id
    }

    fn query(&self, bounds: &Bounds, start: NaiveDate, end: NaiveDate) -> Result<Collection> {
        Ok(self.images.filter_bounds(bounds).filter_date(start, end))
    }
}
