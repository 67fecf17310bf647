use crate::config::types::{ImageFormat, ImagePolicy, SiteConfig};
use crate::config::validation::{
    parse_optional_selector, parse_seed_urls, parse_selector, validate_field_name,
};
use crate::ConfigError;
use scraper::Selector;
use std::path::PathBuf;
use url::Url;

/// A named output field and the selector that fills it
#[derive(Debug, Clone)]
pub struct FieldSelector {
    pub name: String,
    pub selector: Selector,
}

/// A validated site with every selector compiled and every seed parsed
///
/// Built once before the crawl starts and never mutated afterwards, so any
/// configuration problem surfaces before the first request goes out.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub name: String,
    pub seeds: Vec<Url>,
    pub link: Selector,
    pub fields: Vec<FieldSelector>,
    pub image: Option<Selector>,
    pub thumbnail: Option<Selector>,
    pub pagination: Option<Selector>,
    pub output_path: PathBuf,
    pub image_format: ImageFormat,
    pub image_policy: ImagePolicy,
}

impl SiteProfile {
    /// Validates a raw site entry and compiles it
    ///
    /// # Arguments
    ///
    /// * `name` - The site's key in the configuration file
    /// * `site` - The raw site configuration
    ///
    /// # Returns
    ///
    /// * `Ok(SiteProfile)` - Every seed and selector is valid
    /// * `Err(ConfigError)` - The first problem found
    pub fn compile(name: &str, site: &SiteConfig) -> Result<Self, ConfigError> {
        let seeds = parse_seed_urls(&site.url)?;
        let link = parse_selector(&site.link_tag)?;

        if site.fields.is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' must configure at least one field",
                name
            )));
        }

        let fields = site
            .fields
            .iter()
            .map(|(field, selector)| {
                validate_field_name(field)?;
                Ok(FieldSelector {
                    name: field.to_string(),
                    selector: parse_selector(selector)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if site.filename.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' must set an output filename",
                name
            )));
        }

        Ok(Self {
            name: name.to_string(),
            seeds,
            link,
            fields,
            image: parse_optional_selector(site.image_tag.as_deref())?,
            thumbnail: parse_optional_selector(site.thumbnail_tag.as_deref())?,
            pagination: parse_optional_selector(site.pagination.as_deref())?,
            output_path: PathBuf::from(&site.filename),
            image_format: site.image_format,
            image_policy: site.image_policy,
        })
    }

    /// Names of the configured output fields, in output order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}
