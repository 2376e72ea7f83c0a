//! Shared HTML parsing helpers.
//!
//! All parsing is synchronous over `&str`: `scraper::Html` is not `Send`,
//! so document handles must never be held across an await point. Checks
//! fetch first, then hand the body to these helpers.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Hosts excluded from link fan-out. Pages commonly carry badge links to
/// the W3C validators; probing those says nothing about the site itself.
pub const EXCLUDED_LINK_HOSTS: &[&str] = &["validator.w3.org", "jigsaw.w3.org", "w3.org"];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector parses")
}

fn usable_href(href: &str) -> Option<&str> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }
    Some(href)
}

/// Extract all probeable anchor targets from a page.
///
/// Resolves relative hrefs against `base`, keeps only http(s) URLs, strips
/// fragments, drops excluded hosts, and deduplicates.
#[must_use]
pub fn extract_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = selector("a[href]");

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&anchors) {
        let Some(href) = element.value().attr("href").and_then(usable_href) else {
            continue;
        };
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        resolved.set_fragment(None);
        if let Some(host) = resolved.host_str() {
            if EXCLUDED_LINK_HOSTS
                .iter()
                .any(|excluded| host == *excluded || host.ends_with(&format!(".{excluded}")))
            {
                continue;
            }
        }
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }
    links
}

/// Extract all image sources from a page, resolved against `base`.
#[must_use]
pub fn extract_image_sources(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let images = selector("img[src]");

    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for element in document.select(&images) {
        let Some(src) = element.value().attr("src").map(str::trim) else {
            continue;
        };
        if src.is_empty() || src.starts_with("data:") {
            continue;
        }
        let Ok(resolved) = base.join(src) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        let resolved = resolved.to_string();
        if seen.insert(resolved.clone()) {
            sources.push(resolved);
        }
    }
    sources
}

/// Find the site's top navigation menu and return its internal page links.
///
/// Candidate containers are `nav` and `ul` elements; the winning menu is
/// the one with the most direct `li > a` children pointing at the same
/// host, requiring at least two of them. Returns resolved absolute URLs.
#[must_use]
pub fn find_top_menu_links(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let containers = selector("nav, ul");
    let anchors = selector("a[href]");

    let mut best: Vec<String> = Vec::new();
    for container in document.select(&containers) {
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for anchor in container.select(&anchors) {
            let Some(href) = anchor.value().attr("href").and_then(usable_href) else {
                continue;
            };
            if !is_direct_menu_item(container, anchor) {
                continue;
            }
            let Ok(mut resolved) = base.join(href) else {
                continue;
            };
            if resolved.host_str() != base.host_str() {
                continue;
            }
            resolved.set_fragment(None);
            let resolved = resolved.to_string();
            if seen.insert(resolved.clone()) {
                links.push(resolved);
            }
        }
        if links.len() >= 2 && links.len() > best.len() {
            best = links;
        }
    }
    best
}

// An anchor counts as a top-level menu item when its nearest `li` ancestor
// sits directly under the candidate container (or, for `nav` containers
// without list markup, when the anchor itself is a direct child).
fn is_direct_menu_item(container: ElementRef<'_>, anchor: ElementRef<'_>) -> bool {
    let mut node = anchor.parent();
    while let Some(current) = node {
        if current.id() == container.id() {
            // Reached the container without crossing an `li`: direct child
            // anchors only make sense for `nav` containers.
            return container.value().name() == "nav";
        }
        if let Some(element) = ElementRef::wrap(current) {
            if element.value().name() == "li" {
                return current
                    .parent()
                    .is_some_and(|parent| parent.id() == container.id());
            }
        }
        node = current.parent();
    }
    false
}

/// Compare two URLs ignoring trailing slashes and fragments.
#[must_use]
pub fn same_page(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str()
        && a.path().trim_end_matches('/') == b.path().trim_end_matches('/')
        && a.query() == b.query()
}
