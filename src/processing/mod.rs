// src/processing/mod.rs
pub mod collection;
pub mod indices;
pub mod masks;
pub mod parallel;
pub mod stats;

// Re-export main components
pub use collection::{Collection, Composite};
pub use parallel::ParallelProcessor;
