//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a next-page link to an absolute listing URL.
///
/// Any alias of the listing path is rewritten to `listing_path` so every
/// page of the listing is addressed through the same route.
pub fn canonical_listing_url(
    base: &Url,
    href: &str,
    listing_path: &str,
    aliases: &[String],
) -> Option<String> {
    let mut url = base.join(href).ok()?;
    if aliases.iter().any(|alias| alias == url.path()) {
        url.set_path(listing_path);
    }
    Some(url.to_string())
}
