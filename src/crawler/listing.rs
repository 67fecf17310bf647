//! Listing page link collection
//!
//! A listing page yields the product links it enumerates (each with an
//! optional thumbnail) and, in paginated mode, the URL of the next page.

use crate::config::SiteProfile;
use crate::dom::Node;
use crate::url::resolve_href;
use crate::ExtractionError;
use scraper::Selector;
use std::sync::LazyLock;
use url::Url;

pub(crate) static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

/// Attributes holding a thumbnail URL, in priority order
const THUMBNAIL_ATTRIBUTES: [&str; 2] = ["src", "data-src"];

/// A product link found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLink {
    /// Absolute product page URL
    pub url: String,
    /// Absolute thumbnail URL captured from the listing element
    pub thumbnail: Option<String>,
}

/// Everything a listing page contributes to the traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    /// Product links in document order
    pub products: Vec<ProductLink>,
    /// Absolute URL of the next listing page
    pub next_page: Option<String>,
}

/// The selectors that drive link collection
#[derive(Debug, Clone, Copy)]
pub struct ListingSelectors<'a> {
    pub link: &'a Selector,
    pub thumbnail: Option<&'a Selector>,
    pub pagination: Option<&'a Selector>,
}

impl<'a> From<&'a SiteProfile> for ListingSelectors<'a> {
    fn from(profile: &'a SiteProfile) -> Self {
        Self {
            link: &profile.link,
            thumbnail: profile.thumbnail.as_ref(),
            pagination: profile.pagination.as_ref(),
        }
    }
}

/// Collects product links and the next-page URL from a listing page
///
/// # Link Extraction Rules
///
/// - Every element matching the link selector contributes one product, in
///   document order. Its link is the element's own `href` when it is an
///   anchor, otherwise the `href` of its first descendant anchor.
/// - Elements without a usable link are skipped with a warning.
/// - Relative links are anchored at the origin of `page_url`.
///
/// # Pagination Rules
///
/// - Without a pagination selector there is never a next page.
/// - Otherwise the last anchor inside the first pagination container is the
///   next page, unless it resolves to `page_url` itself.
pub fn collect_links<N: Node>(root: N, page_url: &Url, selectors: ListingSelectors<'_>) -> PageResult {
    let mut products = Vec::new();

    for (index, element) in root.find_all(selectors.link).into_iter().enumerate() {
        let Some(url) = anchor_href(element).and_then(|href| resolve_href(&href, page_url)) else {
            let err = ExtractionError::MissingLink {
                page: page_url.to_string(),
                index,
            };
            tracing::warn!("{}", err);
            continue;
        };

        let thumbnail = selectors
            .thumbnail
            .and_then(|selector| thumbnail_src(element, selector))
            .and_then(|src| resolve_href(&src, page_url));

        products.push(ProductLink { url, thumbnail });
    }

    let next_page = selectors
        .pagination
        .and_then(|selector| next_page_href(root, selector))
        .and_then(|href| resolve_href(&href, page_url))
        .filter(|next| {
            let same = is_same_page(next, page_url);
            if same {
                tracing::debug!("Next page link on {} points back to itself", page_url);
            }
            !same
        });

    PageResult {
        products,
        next_page,
    }
}

/// The href of the element itself if it is an anchor, else of its first anchor descendant
fn anchor_href<N: Node>(element: N) -> Option<String> {
    if element.tag() == "a" {
        if let Some(href) = element.attribute("href") {
            return Some(href.to_string());
        }
    }

    element
        .find_first(&ANCHOR)
        .and_then(|anchor| anchor.attribute("href").map(str::to_string))
}

fn thumbnail_src<N: Node>(element: N, selector: &Selector) -> Option<String> {
    let thumbnail = if element.matches(selector) {
        element
    } else {
        element.find_first(selector)?
    };

    THUMBNAIL_ATTRIBUTES
        .iter()
        .find_map(|attr| thumbnail.attribute(attr))
        .map(str::to_string)
}

fn next_page_href<N: Node>(root: N, pagination: &Selector) -> Option<String> {
    let container = root.find_first(pagination)?;
    let last = container.find_all(&ANCHOR).last().copied()?;
    last.attribute("href").map(str::to_string)
}

/// Compares a resolved link with the page URL after URL normalization
fn is_same_page(candidate: &str, page_url: &Url) -> bool {
    match Url::parse(candidate) {
        Ok(candidate) => &candidate == page_url,
        Err(_) => candidate == page_url.as_str(),
    }
}
