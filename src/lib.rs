//! Product Harvester: a selector-driven product catalog scraper
//!
//! This crate walks paginated e-commerce listing pages, extracts one record per
//! product page using configured CSS selectors, and writes the collected
//! catalog as a JSON array.

pub mod config;
pub mod crawler;
pub mod dom;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Harvest cancelled")]
    Cancelled,
}

impl HarvestError {
    /// True if this error stems from the run being cancelled
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Fetch(FetchError::Cancelled { .. })
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Unknown site '{name}' (available: {available})")]
    UnknownSite { name: String, available: String },
}

/// Network and HTTP failures while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Fetch cancelled for {url}")]
    Cancelled { url: String },
}

impl FetchError {
    /// Returns true if a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Client(_) | Self::Cancelled { .. } => false,
        }
    }
}

/// Failures to make sense of a fetched page
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Expected HTML from {url}, got {content_type}")]
    NotHtml { url: String, content_type: String },

    #[error("Listing element {index} on {page} has no product link")]
    MissingLink { page: String, index: usize },
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::{load_config, ConfigFile, SiteConfig, SiteProfile};
pub use crawler::{run_harvest, Coordinator, Fetcher};
pub use output::{CatalogEntry, CrawlReport, ProductRecord};
