//! Harvest coordinator - main traversal logic
//!
//! This module contains the loop that drives a harvest:
//! - Walking each seed's listing pages until pagination ends
//! - Scraping every product linked from a listing page
//! - Isolating failures to the product or seed they belong to
//! - Writing the catalog once every seed is done

use crate::config::{FetchConfig, SiteProfile};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::listing::{collect_links, ListingSelectors, ProductLink};
use crate::crawler::product::scrape_product;
use crate::output::{write_catalog, AbortedSeed, CatalogEntry, CrawlReport, FailedProduct, ProductRecord};
use crate::HarvestError;
use std::collections::HashSet;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// The result of a completed traversal, before it is written out
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    /// Every record collected, in crawl order
    pub catalog: Vec<CatalogEntry>,
    pub report: CrawlReport,
}

/// What one listing page contributed
struct ListingOutcome {
    entries: Vec<CatalogEntry>,
    next_page: Option<String>,
}

/// Drives the traversal for one site
///
/// Owns the site profile and the run's HTTP session.
pub struct Coordinator {
    profile: SiteProfile,
    fetcher: Fetcher,
}

impl Coordinator {
    /// Creates a new coordinator instance
    pub fn new(profile: SiteProfile, fetcher: Fetcher) -> Self {
        Self { profile, fetcher }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Runs the traversal over every seed
    ///
    /// For each seed, listing pages are followed until no next page is found.
    /// A listing page failure ends that seed only; a product page failure
    /// skips that product only. Cancellation aborts the whole run.
    ///
    /// # Returns
    ///
    /// * `Ok(Harvest)` - The collected catalog and run statistics
    /// * `Err(HarvestError::Cancelled)` - The token was cancelled
    pub async fn run(&self, cancel: &CancellationToken) -> Result<Harvest, HarvestError> {
        let start_time = Instant::now();
        let mut catalog = Vec::new();
        let mut report = CrawlReport::new(&self.profile.name);

        tracing::info!(
            "Starting harvest of '{}' from {} seed URL(s)",
            self.profile.name,
            self.profile.seeds.len()
        );

        for seed in &self.profile.seeds {
            let seed = seed.to_string();
            let mut current = Some(seed.clone());
            let mut visited = HashSet::new();
            let mut page_number = 1;
            let mut aborted = false;

            while let Some(page_url) = current.take() {
                if !visited.insert(page_key(&page_url)) {
                    tracing::warn!("Listing page {} already visited, ending pagination", page_url);
                    break;
                }

                match self
                    .process_listing(&page_url, page_number, &mut visited, &mut report, cancel)
                    .await
                {
                    Ok(Some(outcome)) => {
                        catalog.extend(outcome.entries);
                        current = outcome.next_page;
                        page_number += 1;
                    }
                    Ok(None) => break,
                    Err(e) if e.is_cancellation() => return Err(HarvestError::Cancelled),
                    Err(e) => {
                        tracing::error!("Abandoning seed {} at listing page {}: {}", seed, page_url, e);
                        report.seeds_aborted.push(AbortedSeed {
                            seed: seed.clone(),
                            page: page_url,
                            message: e.to_string(),
                        });
                        aborted = true;
                    }
                }
            }

            if !aborted {
                report.seeds_completed += 1;
            }
        }

        report.elapsed = start_time.elapsed();
        tracing::info!(
            "Harvest of '{}' finished: {} products from {} listing pages in {:?}",
            self.profile.name,
            report.products_scraped,
            report.listing_pages,
            report.elapsed
        );

        Ok(Harvest { catalog, report })
    }

    /// Processes one listing page and every product it links to
    ///
    /// Returns `Ok(None)` when the page redirected to a listing page that was
    /// already visited for this seed.
    async fn process_listing(
        &self,
        page_url: &str,
        page_number: usize,
        visited: &mut HashSet<String>,
        report: &mut CrawlReport,
        cancel: &CancellationToken,
    ) -> Result<Option<ListingOutcome>, HarvestError> {
        let listing = {
            let document = self.fetcher.fetch(page_url, cancel).await?;
            let landed = page_key(document.url().as_str());
            if landed != page_key(page_url) && !visited.insert(landed) {
                tracing::warn!(
                    "Listing page {} redirected to already visited {}, ending pagination",
                    page_url,
                    document.url()
                );
                return Ok(None);
            }
            collect_links(document.root(), document.url(), ListingSelectors::from(&self.profile))
        };
        report.listing_pages += 1;

        let total = listing.products.len();
        tracing::info!("Page {}: {} products on {}", page_number, total, page_url);

        let mut entries = Vec::with_capacity(total);
        for (index, link) in listing.products.iter().enumerate() {
            match self.scrape(link, cancel).await {
                Ok(record) => {
                    entries.push(CatalogEntry::from(record));
                    report.products_scraped += 1;
                }
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    tracing::error!("Error occurred while scraping {}: {}", link.url, e);
                    report.products_failed.push(FailedProduct {
                        url: link.url.clone(),
                        message: e.to_string(),
                    });
                }
            }

            tracing::info!("Page {}: {}/{}", page_number, index + 1, total);
        }

        Ok(Some(ListingOutcome {
            entries,
            next_page: listing.next_page,
        }))
    }

    /// Fetches a product page and extracts its record
    async fn scrape(&self, link: &ProductLink, cancel: &CancellationToken) -> Result<ProductRecord, HarvestError> {
        let document = self.fetcher.fetch(&link.url, cancel).await?;
        Ok(scrape_product(&document, &self.profile, link))
    }
}

/// Canonical form of a listing URL for the visited set
///
/// Parsing lowercases the scheme and host, drops default ports and resolves
/// dot segments. The fragment never selects a different page.
fn page_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

/// Runs a complete harvest for one site
///
/// This function:
///
/// 1. Builds the run's HTTP session
/// 2. Traverses every seed and its pagination
/// 3. Writes the catalog to the site's output path, replacing any old file
///
/// Nothing is written if the run is cancelled.
///
/// # Arguments
///
/// * `profile` - The compiled site to harvest
/// * `fetch` - HTTP session settings
/// * `cancel` - Token that aborts the run when cancelled
///
/// # Example
///
/// ```no_run
/// use product_harvester::config::{load_config, SiteProfile};
/// use product_harvester::crawler::run_harvest;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sites.toml"))?;
/// let (name, site) = config.site(None)?;
/// let profile = SiteProfile::compile(name, site)?;
/// let report = run_harvest(profile, &config.fetch, &CancellationToken::new()).await?;
/// println!("{} products", report.products_scraped);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(
    profile: SiteProfile,
    fetch: &FetchConfig,
    cancel: &CancellationToken,
) -> Result<CrawlReport, HarvestError> {
    let fetcher = Fetcher::new(fetch)?;
    let coordinator = Coordinator::new(profile, fetcher);

    let harvest = coordinator.run(cancel).await?;
    write_catalog(&coordinator.profile().output_path, &harvest.catalog)?;

    Ok(harvest.report)
}
