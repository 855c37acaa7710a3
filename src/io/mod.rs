// src/io/mod.rs
pub mod reader;
pub mod vector;
pub mod writer;

pub use reader::{parse_acquisition_date, read_image, CatalogEntry};
pub use vector::{read_extent, read_point_features};
pub use writer::{write_composite, write_rgba, Encoding, WriteOptions};
