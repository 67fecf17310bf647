//! Product records and catalog entries
//!
//! Records serialize their keys in a fixed order: the configured fields in
//! configuration order, then `url`, then `images` when an image selector was
//! configured. Downstream consumers rely on this layout.

use crate::config::ImageFormat;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// One image reference in a product record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ImageEntry {
    Url(String),
    Src { src: String },
}

impl ImageEntry {
    /// Wraps a URL in the configured output shape
    pub fn new(url: String, format: ImageFormat) -> Self {
        match format {
            ImageFormat::Plain => Self::Url(url),
            ImageFormat::SrcObject => Self::Src { src: url },
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Src { src: url } => url,
        }
    }
}

/// Extracted data for a single product page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    fields: Vec<(String, String)>,
    url: String,
    images: Option<Vec<ImageEntry>>,
}

impl ProductRecord {
    /// Creates a record without images
    pub fn new(fields: Vec<(String, String)>, url: impl Into<String>) -> Self {
        Self {
            fields,
            url: url.into(),
            images: None,
        }
    }

    /// Attaches the image list
    pub fn with_images(mut self, images: Vec<ImageEntry>) -> Self {
        self.images = Some(images);
        self
    }

    /// Value extracted for a field, if that field was configured
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn images(&self) -> Option<&[ImageEntry]> {
        self.images.as_deref()
    }
}

impl Serialize for ProductRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + 1 + usize::from(self.images.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("url", &self.url)?;
        if let Some(images) = &self.images {
            map.serialize_entry("images", images)?;
        }
        map.end()
    }
}

/// A catalog element: `{"product": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub product: ProductRecord,
}

impl From<ProductRecord> for CatalogEntry {
    fn from(product: ProductRecord) -> Self {
        Self { product }
    }
}
