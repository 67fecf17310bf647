use crate::config::types::{ConfigFile, FetchConfig, SeedUrls};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Record keys that every product already carries
const RESERVED_FIELD_NAMES: [&str; 2] = ["url", "images"];

/// Validates the settings shared by every site
///
/// Individual sites are checked when the chosen one is compiled with
/// [`SiteProfile::compile`](crate::config::SiteProfile::compile).
pub fn validate(config: &ConfigFile) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;

    if config.sites.is_empty() {
        return Err(ConfigError::Validation(
            "configuration must define at least one site".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP session configuration
pub fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses every seed URL, requiring an absolute http(s) URL
pub(crate) fn parse_seed_urls(seeds: &SeedUrls) -> Result<Vec<Url>, ConfigError> {
    let seeds = seeds.as_slice();
    if seeds.is_empty() {
        return Err(ConfigError::Validation(
            "at least one seed URL is required".to_string(),
        ));
    }

    seeds
        .iter()
        .map(|seed| {
            let url = Url::parse(seed).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigError::InvalidUrl(format!(
                    "Seed URL '{}' must use http or https",
                    seed
                )));
            }

            if url.host_str().is_none() {
                return Err(ConfigError::InvalidUrl(format!(
                    "Seed URL '{}' has no host",
                    seed
                )));
            }

            Ok(url)
        })
        .collect()
}

/// Parses a CSS selector, turning the parser's borrowed error into a config error
pub(crate) fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: "selector cannot be empty".to_string(),
        });
    }

    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parses an optional selector
pub(crate) fn parse_optional_selector(
    selector: Option<&str>,
) -> Result<Option<Selector>, ConfigError> {
    selector.map(parse_selector).transpose()
}

/// Validates an output field name
pub(crate) fn validate_field_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "field names cannot be empty".to_string(),
        ));
    }

    if RESERVED_FIELD_NAMES.contains(&name) {
        return Err(ConfigError::Validation(format!(
            "field name '{}' is reserved",
            name
        )));
    }

    Ok(())
}
