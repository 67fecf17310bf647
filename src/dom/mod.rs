//! Minimal DOM access used by every extractor
//!
//! Extractors only see the [`Node`] trait: find the first or all matches of a
//! selector, read an attribute, read trimmed text. The trait is implemented
//! once over `scraper`, which parses malformed HTML best-effort instead of
//! rejecting it.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A parsed page together with the URL it was fetched from
pub struct Document {
    url: Url,
    html: Html,
}

impl Document {
    /// Parses an HTML body
    pub fn parse(url: Url, body: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(body),
        }
    }

    /// The URL this page was served from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The `<html>` element; selectors search its descendants
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }
}

/// Selector-driven access to an element tree
pub trait Node: Copy {
    /// First descendant matching `selector`, in document order
    fn find_first(&self, selector: &Selector) -> Option<Self>;

    /// Every descendant matching `selector`, in document order
    fn find_all(&self, selector: &Selector) -> Vec<Self>;

    /// True if this element itself matches `selector`
    fn matches(&self, selector: &Selector) -> bool;

    fn attribute(&self, name: &str) -> Option<&str>;

    /// Concatenated text content with surrounding whitespace removed
    fn text_content(&self) -> String;

    /// Lowercase tag name
    fn tag(&self) -> &str;

    fn parent_element(&self) -> Option<Self>;
}

impl<'a> Node for ElementRef<'a> {
    fn find_first(&self, selector: &Selector) -> Option<Self> {
        self.select(selector).next()
    }

    fn find_all(&self, selector: &Selector) -> Vec<Self> {
        self.select(selector).collect()
    }

    fn matches(&self, selector: &Selector) -> bool {
        selector.matches(self)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn text_content(&self) -> String {
        self.text().collect::<String>().trim().to_string()
    }

    fn tag(&self) -> &str {
        self.value().name()
    }

    fn parent_element(&self) -> Option<Self> {
        (**self).parent().and_then(ElementRef::wrap)
    }
}
