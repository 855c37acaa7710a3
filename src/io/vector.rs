// src/io/vector.rs
use std::path::Path;

use gdal::vector::LayerAccess;
use gdal::Dataset;
use gdal_sys::OGREnvelope;
use tracing::{debug, warn};

use crate::error::Result;
use crate::region::{Bounds, PointFeature};

fn envelope_bounds(envelope: &OGREnvelope) -> Bounds {
    Bounds::new(envelope.MinX, envelope.MinY, envelope.MaxX, envelope.MaxY)
}

/// Reads the first layer of a vector dataset as point features identified by `id_field`.
/// Non-point geometries are reduced to the center of their envelope.
pub fn read_point_features(path: &Path, id_field: &str) -> Result<Vec<PointFeature>> {
    let dataset = Dataset::open(path)?;
    let mut layer = dataset.layer(0)?;

    let mut features = Vec::new();
    for feature in layer.features() {
        let field_index = feature.field_index(id_field)?;
        let Some(id) = feature.field_as_string(field_index)? else {
            warn!(field = id_field, "skipping feature without an id");
            continue;
        };
        let Some(geometry) = feature.geometry() else {
            warn!(%id, "skipping feature without geometry");
            continue;
        };
        let (x, y) = envelope_bounds(&geometry.envelope()).center();
        features.push(PointFeature::new(id, x, y));
    }

    debug!(path = %path.display(), count = features.len(), "read point features");
    Ok(features)
}

/// Extent of the first layer of a vector dataset.
pub fn read_extent(path: &Path) -> Result<Bounds> {
    let dataset = Dataset::open(path)?;
    let layer = dataset.layer(0)?;
    let envelope = layer.get_extent()?;
    Ok(envelope_bounds(&envelope))
}
