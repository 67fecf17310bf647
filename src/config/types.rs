use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;

/// Top-level configuration file: shared fetch settings plus named sites
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub sites: BTreeMap<String, SiteConfig>,
}

/// HTTP session configuration shared by every request of a run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Whole-request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// Retries for transient failures after the first attempt
    pub max_retries: u32,

    /// Base backoff delay, doubled after each failed attempt (milliseconds)
    pub retry_backoff_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            retry_backoff_ms: 500,
            user_agent: format!("product-harvester/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// One scrapeable site, as written in the configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Seed listing page(s)
    pub url: SeedUrls,

    /// Selector for the per-product elements on a listing page
    pub link_tag: String,

    /// Output field name to selector, in output order
    pub fields: FieldMap,

    /// Selector for product images on a product page
    #[serde(default)]
    pub image_tag: Option<String>,

    /// Selector for the thumbnail inside a listing element
    #[serde(default)]
    pub thumbnail_tag: Option<String>,

    /// Selector for the pagination container on a listing page
    #[serde(default)]
    pub pagination: Option<String>,

    /// Output file path for the catalog
    pub filename: String,

    #[serde(default)]
    pub image_format: ImageFormat,

    #[serde(default)]
    pub image_policy: ImagePolicy,
}

/// Either a single seed URL or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeedUrls {
    Single(String),
    Many(Vec<String>),
}

impl SeedUrls {
    /// Returns the seeds as a slice, regardless of how they were written
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Single(url) => std::slice::from_ref(url),
            Self::Many(urls) => urls,
        }
    }
}

/// How image URLs are written into each record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFormat {
    /// `"images": ["https://..."]`
    #[default]
    Plain,
    /// `"images": [{"src": "https://..."}]`
    SrcObject,
}

/// What to do with an image element that has no resolvable source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImagePolicy {
    /// End collection at the first unresolvable element
    #[default]
    StopAtFirstMissing,
    /// Skip the unresolvable element and keep going
    SkipMissing,
}

/// Ordered field-name to selector mapping
///
/// Deserialized through a map visitor so entries keep the order in which
/// they appear in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(Vec<(String, String)>);

impl FieldMap {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldMapVisitor;

        impl<'de> Visitor<'de> for FieldMapVisitor {
            type Value = FieldMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of field names to CSS selectors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldMap, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, selector)) = map.next_entry::<String, String>()? {
                    if entries.iter().any(|(existing, _)| existing == &name) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate field '{}'",
                            name
                        )));
                    }
                    entries.push((name, selector));
                }
                Ok(FieldMap(entries))
            }
        }

        deserializer.deserialize_map(FieldMapVisitor)
    }
}
