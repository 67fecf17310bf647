//! Crawler module for listing traversal and product extraction
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry and cancellation
//! - Listing page link and pagination collection
//! - Product field and image extraction
//! - Overall traversal coordination

mod coordinator;
mod fetcher;
mod listing;
mod product;

pub use coordinator::{run_harvest, Coordinator, Harvest};
pub use fetcher::{backoff_delay, build_http_client, FetchedBody, Fetcher};
pub use listing::{collect_links, ListingSelectors, PageResult, ProductLink};
pub use product::{extract_fields, extract_images, scrape_product};
