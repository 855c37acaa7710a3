// src/lib.rs
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod io;
pub mod pipeline;
pub mod presenter;
pub mod processing;
pub mod region;
pub mod utils;

pub use error::{Error, Result};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
