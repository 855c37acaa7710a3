// src/region.rs
//! Point features, their buffered regions, and bounding boxes.
//!
//! Coordinates are longitude/latitude degrees; buffer radii are meters.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Bounds::new(x, y, x, y),
                Some(b) => b.union(&Bounds::new(x, y, x, y)),
            })
        })
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFeature {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl PointFeature {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedFeature {
    pub feature: PointFeature,
    pub radius_m: f64,
}

impl BufferedFeature {
    /// Geodesic point-in-disc test. The pipeline only displays the disc and
    /// samples the chart at the unbuffered point; this is for callers that
    /// need the buffered area itself.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        haversine_m((self.feature.x, self.feature.y), (x, y)) <= self.radius_m
    }

    pub fn bounds(&self) -> Bounds {
        let (x, y) = (self.feature.x, self.feature.y);
        let dlat = (self.radius_m / EARTH_RADIUS_M).to_degrees();
        let cos_lat = y.to_radians().cos().abs().max(1e-12);
        let dlon = (dlat / cos_lat).min(180.0);
        Bounds::new(x - dlon, y - dlat, x + dlon, y + dlat)
    }
}

/// Selected features, each buffered to a disc. Empty when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    features: Vec<BufferedFeature>,
}

impl Region {
    pub fn features(&self) -> &[BufferedFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Unbuffered locations, used to sample the time series.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.features
            .iter()
            .map(|f| (f.feature.x, f.feature.y))
            .collect()
    }

    /// True when any buffered disc holds `(x, y)`. See [`BufferedFeature::contains`].
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.features.iter().any(|f| f.contains(x, y))
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.features
            .iter()
            .map(BufferedFeature::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.features.is_empty() {
            return None;
        }
        let n = self.features.len() as f64;
        let (sx, sy) = self
            .features
            .iter()
            .fold((0.0, 0.0), |(sx, sy), f| (sx + f.feature.x, sy + f.feature.y));
        Some((sx / n, sy / n))
    }
}

/// Keeps the features whose id is listed and buffers each by `radius_m`.
pub fn select_region(features: &[PointFeature], ids: &[String], radius_m: f64) -> Region {
    let features = features
        .iter()
        .filter(|f| ids.iter().any(|id| *id == f.id))
        .map(|f| BufferedFeature {
            feature: f.clone(),
            radius_m,
        })
        .collect();
    Region { features }
}

/// Great-circle distance in meters between two lon/lat points.
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}
