//! Run statistics for a harvest
//!
//! Collected by the coordinator as it goes and printed once the catalog has
//! been written.

use std::time::Duration;

/// A product page that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedProduct {
    pub url: String,
    pub message: String,
}

/// A seed whose traversal ended on a listing page failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortedSeed {
    pub seed: String,
    pub page: String,
    pub message: String,
}

/// Summary of one harvest run
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Site name from the configuration
    pub site: String,

    /// Seeds whose traversal ran to completion
    pub seeds_completed: usize,

    /// Seeds cut short by a listing page failure
    pub seeds_aborted: Vec<AbortedSeed>,

    /// Listing pages fetched and parsed
    pub listing_pages: usize,

    /// Records added to the catalog
    pub products_scraped: usize,

    /// Product pages skipped after an error
    pub products_failed: Vec<FailedProduct>,

    pub elapsed: Duration,
}

impl CrawlReport {
    pub fn new(site: impl Into<String>) -> Self {
        Self {
            site: site.into(),
            ..Self::default()
        }
    }

    /// True if every seed completed and no product failed
    pub fn is_clean(&self) -> bool {
        self.seeds_aborted.is_empty() && self.products_failed.is_empty()
    }
}

/// Prints a run summary to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Harvest Summary: {} ===\n", report.site);
    println!("  Seeds completed:  {}", report.seeds_completed);
    println!("  Seeds aborted:    {}", report.seeds_aborted.len());
    println!("  Listing pages:    {}", report.listing_pages);
    println!("  Products scraped: {}", report.products_scraped);
    println!("  Products failed:  {}", report.products_failed.len());
    println!("  Elapsed:          {:.1}s", report.elapsed.as_secs_f64());

    if !report.seeds_aborted.is_empty() {
        println!("\nAborted seeds:");
        for aborted in &report.seeds_aborted {
            println!("  - {} (at {}): {}", aborted.seed, aborted.page, aborted.message);
        }
    }

    if !report.products_failed.is_empty() {
        println!("\nFailed products:");
        for failed in &report.products_failed {
            println!("  - {}: {}", failed.url, failed.message);
        }
    }
}
