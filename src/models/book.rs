//! Book records as listed, enriched, and persisted.

use serde::{Deserialize, Serialize};

/// Identity and list-page facts for one book.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookSummary {
    /// Book title
    #[serde(default)]
    pub title: String,

    /// Canonical absolute URL of the detail page (identity key)
    #[serde(default)]
    pub url: String,

    /// Cover image URL (may be empty)
    #[serde(default)]
    pub image: String,

    /// List price, digits and thousand separators only (may be empty)
    #[serde(default)]
    pub original_price: String,

    /// Sale price, digits and thousand separators only (may be empty)
    #[serde(default)]
    pub sale_price: String,

    /// Discount label (may be empty)
    #[serde(default)]
    pub discount: String,
}

/// Fields filled in from the detail page.
///
/// Every field is optional: `None` means "never obtained", which is distinct
/// from an obtained-but-empty value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sorted, deduplicated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl BookDetail {
    /// True when a non-empty author has been recorded.
    ///
    /// This is the cache signal for "detail already fetched".
    pub fn has_author(&self) -> bool {
        self.author.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// True when no detail field is present.
    pub fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.publisher.is_none()
            && self.date_published.is_none()
            && self.description.is_none()
            && self.categories.is_none()
    }

    /// Overlay the fields present in `other`, leaving the rest untouched.
    pub fn merge(&mut self, other: BookDetail) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.publisher.is_some() {
            self.publisher = other.publisher;
        }
        if other.date_published.is_some() {
            self.date_published = other.date_published;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        if other.categories.is_some() {
            self.categories = other.categories;
        }
    }
}

/// A listed book with its detail fields and novelty flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    #[serde(flatten)]
    pub summary: BookSummary,

    /// True iff the URL was absent from the previous snapshot
    #[serde(default)]
    pub is_new: bool,

    #[serde(flatten)]
    pub detail: BookDetail,
}

impl Book {
    pub fn url(&self) -> &str {
        &self.summary.url
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }

    /// Publication date, if known and non-empty.
    pub fn date_published(&self) -> Option<&str> {
        self.detail
            .date_published
            .as_deref()
            .filter(|d| !d.trim().is_empty())
    }
}

impl From<BookSummary> for Book {
    fn from(summary: BookSummary) -> Self {
        Self {
            summary,
            is_new: false,
            detail: BookDetail::default(),
        }
    }
}
