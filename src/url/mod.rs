//! Link resolution for scraped hrefs
//!
//! Listing pages hand out product and pagination links as written in the
//! markup. These are turned into absolute URLs by anchoring relative forms
//! at the origin (`scheme://host[:port]`) of the page they came from.

use url::Url;

/// Returns `scheme://host[:port]` for a page URL
///
/// # Examples
///
/// ```
/// use product_harvester::url::page_origin;
/// use url::Url;
///
/// let page = Url::parse("https://shop.example/collections/all?page=2").unwrap();
/// assert_eq!(page_origin(&page), "https://shop.example");
/// ```
pub fn page_origin(page_url: &Url) -> String {
    page_url.origin().ascii_serialization()
}

/// Resolves an href found on `page_url` to an absolute URL
///
/// Returns None if the link should be ignored:
/// - empty hrefs
/// - javascript:, mailto:, tel: schemes and data: URIs
/// - fragment-only links
///
/// Absolute `http(s)` hrefs are returned unchanged, so resolution is
/// idempotent.
///
/// # Examples
///
/// ```
/// use product_harvester::url::resolve_href;
/// use url::Url;
///
/// let page = Url::parse("https://shop.example/collections/all").unwrap();
/// assert_eq!(
///     resolve_href("/products/malbec", &page).as_deref(),
///     Some("https://shop.example/products/malbec")
/// );
/// assert_eq!(
///     resolve_href("https://cdn.example/a.jpg", &page).as_deref(),
///     Some("https://cdn.example/a.jpg")
/// );
/// ```
pub fn resolve_href(href: &str, page_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(href.to_string());
    }

    if href.starts_with("//") {
        return Some(format!("{}:{}", page_url.scheme(), href));
    }

    let origin = page_origin(page_url);
    if href.starts_with('/') {
        Some(format!("{}{}", origin, href))
    } else {
        Some(format!("{}/{}", origin, href))
    }
}
