use crate::config::types::{ConfigFile, FetchConfig, SiteConfig};
use crate::config::validation::validate;
use crate::ConfigError;
use serde::de::IgnoredAny;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Files ending in `.json` are read as JSON, either with a top-level `sites`
/// object or as a bare object of site name to site (the layout of a classic
/// `sites_config.json`). Anything else is read as TOML.
///
/// # Arguments
///
/// * `path` - Path to the configuration file
///
/// # Returns
///
/// * `Ok(ConfigFile)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use product_harvester::config::load_config;
///
/// let config = load_config(Path::new("sites.toml")).unwrap();
/// println!("Sites: {:?}", config.sites.keys().collect::<Vec<_>>());
/// ```
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: ConfigFile = if is_json {
        parse_json(&content)?
    } else {
        toml::from_str(&content)?
    };

    validate(&config)?;

    Ok(config)
}

fn parse_json(content: &str) -> Result<ConfigFile, ConfigError> {
    let keys: BTreeMap<String, IgnoredAny> = serde_json::from_str(content)?;
    if keys.contains_key("sites") {
        return Ok(serde_json::from_str(content)?);
    }

    let sites: BTreeMap<String, SiteConfig> = serde_json::from_str(content)?;
    Ok(ConfigFile {
        fetch: FetchConfig::default(),
        sites,
    })
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a catalog can be traced back to the exact
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(ConfigFile, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

impl ConfigFile {
    /// Selects the site to crawl
    ///
    /// With a name, returns that site. Without one, returns the only
    /// configured site, or an error if there is more than one to choose from.
    pub fn site(&self, name: Option<&str>) -> Result<(&str, &SiteConfig), ConfigError> {
        match name {
            Some(name) => self
                .sites
                .get_key_value(name)
                .map(|(key, site)| (key.as_str(), site))
                .ok_or_else(|| ConfigError::UnknownSite {
                    name: name.to_string(),
                    available: self.site_names(),
                }),
            None => {
                let mut sites = self.sites.iter();
                match (sites.next(), sites.next()) {
                    (Some((key, site)), None) => Ok((key.as_str(), site)),
                    (None, _) => Err(ConfigError::Validation(
                        "configuration defines no sites".to_string(),
                    )),
                    _ => Err(ConfigError::Validation(format!(
                        "several sites configured, choose one with --site ({})",
                        self.site_names()
                    ))),
                }
            }
        }
    }

    fn site_names(&self) -> String {
        self.sites.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
