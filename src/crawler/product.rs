//! Product page extraction
//!
//! Turns a product page into a [`ProductRecord`]: one text value per
//! configured field, the product URL, and optionally its image URLs.

use crate::config::{FieldSelector, ImagePolicy, SiteProfile};
use crate::crawler::listing::{ProductLink, ANCHOR};
use crate::dom::{Document, Node};
use crate::output::{ImageEntry, ProductRecord};
use crate::url::resolve_href;
use scraper::Selector;
use url::Url;

/// Lazy-loading attribute checked before falling back to an anchor
const LAZY_SOURCE_ATTRIBUTE: &str = "data-src";

/// Extracts every configured field from a product page
///
/// Fields keep configuration order. A selector with no match yields an
/// empty string, never a missing entry.
pub fn extract_fields<N: Node>(root: N, fields: &[FieldSelector]) -> Vec<(String, String)> {
    fields
        .iter()
        .map(|field| {
            let value = root
                .find_first(&field.selector)
                .map(|element| element.text_content())
                .unwrap_or_default();
            (field.name.clone(), value)
        })
        .collect()
}

/// Extracts image URLs from a product page
///
/// Each element matching `selector` is resolved, in document order, through
/// the chain `data-src` attribute, then the `href` of its container anchor.
/// Under [`ImagePolicy::StopAtFirstMissing`] the first element that resolves
/// to nothing ends collection; under [`ImagePolicy::SkipMissing`] it is
/// skipped. A thumbnail captured on the listing page goes first.
pub fn extract_images<N: Node>(
    root: N,
    page_url: &Url,
    selector: &Selector,
    thumbnail: Option<&str>,
    policy: ImagePolicy,
) -> Vec<String> {
    let mut images: Vec<String> = thumbnail.map(str::to_string).into_iter().collect();

    for (index, element) in root.find_all(selector).into_iter().enumerate() {
        match image_source(element, page_url) {
            Some(url) => images.push(url),
            None => match policy {
                ImagePolicy::StopAtFirstMissing => {
                    tracing::debug!(
                        "Image element {} on {} has no source, stopping image collection",
                        index,
                        page_url
                    );
                    break;
                }
                ImagePolicy::SkipMissing => {
                    tracing::debug!("Image element {} on {} has no source, skipping", index, page_url);
                }
            },
        }
    }

    images
}

/// Builds the record for one product page
pub fn scrape_product(document: &Document, profile: &SiteProfile, link: &ProductLink) -> ProductRecord {
    let root = document.root();
    let record = ProductRecord::new(extract_fields(root, &profile.fields), link.url.clone());

    match &profile.image {
        Some(selector) => {
            let images = extract_images(
                root,
                document.url(),
                selector,
                link.thumbnail.as_deref(),
                profile.image_policy,
            )
            .into_iter()
            .map(|url| ImageEntry::new(url, profile.image_format))
            .collect();
            record.with_images(images)
        }
        None => record,
    }
}

fn image_source<N: Node>(element: N, page_url: &Url) -> Option<String> {
    element
        .attribute(LAZY_SOURCE_ATTRIBUTE)
        .and_then(|src| resolve_href(src, page_url))
        .or_else(|| {
            container_anchor(element)
                .and_then(|anchor| anchor.attribute("href").and_then(|href| resolve_href(href, page_url)))
        })
}

/// The anchor an image lives in: itself, its nearest anchor ancestor, or its
/// first anchor descendant
fn container_anchor<N: Node>(element: N) -> Option<N> {
    let is_anchor = |node: &N| node.tag() == "a" && node.attribute("href").is_some();

    if is_anchor(&element) {
        return Some(element);
    }

    let mut current = element.parent_element();
    while let Some(node) = current {
        if is_anchor(&node) {
            return Some(node);
        }
        current = node.parent_element();
    }

    element.find_first(&ANCHOR)
}
