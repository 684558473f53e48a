//! Service layer for the crawler.
//!
//! - Listing page parsing (`ListParser`)
//! - Detail page parsing (`DetailParser`)
//! - Renderer/notifier hand-off (`Digest`, `RecencyWindow`, `MailCredentials`)

mod detail;
mod digest;
mod listing;

pub use detail::{DetailParser, StructuredData};
pub use digest::{Digest, MailCredentials, RecencyWindow, filter_recent};
pub use listing::{ListParser, ListingPage};

use scraper::Selector;

use crate::error::{AppError, Result};

/// Compile a CSS selector, mapping failures into [`AppError::Selector`].
pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selector_valid() {
        assert!(parse_selector("li.single-book").is_ok());
        assert!(parse_selector("a[href^='/categories/']").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector("[[invalid").is_err());
    }
}
