//! Configuration module for Product Harvester
//!
//! This module handles loading, parsing, and validating site configuration
//! files, and compiles the chosen site into a [`SiteProfile`].
//!
//! # Example
//!
//! ```no_run
//! use product_harvester::config::{load_config, SiteProfile};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sites.toml")).unwrap();
//! let (name, site) = config.site(Some("catador")).unwrap();
//! let profile = SiteProfile::compile(name, site).unwrap();
//! println!("Crawling {} seed(s)", profile.seeds.len());
//! ```

mod parser;
mod profile;
mod types;
mod validation;

// Re-export types
pub use profile::{FieldSelector, SiteProfile};
pub use types::{ConfigFile, FetchConfig, FieldMap, ImageFormat, ImagePolicy, SeedUrls, SiteConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate_fetch_config;
