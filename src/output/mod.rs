//! Output module for catalog serialization and run reporting
//!
//! This module handles:
//! - The product record and catalog entry shapes
//! - Writing the catalog as a JSON array
//! - Summarizing a run

mod json;
mod record;
pub mod stats;

pub use json::{render_catalog, write_catalog, OutputError, OutputResult};
pub use record::{CatalogEntry, ImageEntry, ProductRecord};
pub use stats::{print_report, AbortedSeed, CrawlReport, FailedProduct};
