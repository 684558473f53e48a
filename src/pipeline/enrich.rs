// src/pipeline/enrich.rs

//! Detail enrichment with a cache backed by the previous snapshot.
//!
//! A previous record with a non-empty author is a cache hit and its detail
//! fields are reused verbatim. Everything else is fetched, one request at a
//! time. Failures are contained per book.

use std::time::Duration;

use serde::Serialize;

use crate::models::Book;
use crate::pipeline::diff::SnapshotIndex;
use crate::services::DetailParser;
use crate::utils::http::PageFetcher;

/// A detail fetch that failed; the book kept whatever it already had.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DetailFailure {
    pub title: String,
    pub url: String,
    pub message: String,
}

/// Counts from one enrichment pass.
#[derive(Debug, Default, Clone)]
pub struct EnrichOutcome {
    pub cached: usize,
    pub fetched: usize,
    pub failures: Vec<DetailFailure>,
}

/// Reuse cached detail where possible. Returns indices of books that still
/// need a detail fetch, in listing order.
pub fn apply_cache(books: &mut [Book], index: &SnapshotIndex) -> Vec<usize> {
    let mut to_fetch = Vec::new();
    for (i, book) in books.iter_mut().enumerate() {
        match index.get(book.url()) {
            Some(previous) if previous.detail.has_author() => {
                book.detail.merge(previous.detail.clone());
            }
            _ => to_fetch.push(i),
        }
    }
    to_fetch
}

/// Skip-enrichment mode: carry every previously known detail field forward
/// without any network traffic.
pub fn carry_forward(books: &mut [Book], index: &SnapshotIndex) -> usize {
    let mut carried = 0;
    for book in books.iter_mut() {
        if let Some(previous) = index.get(book.url()) {
            if !previous.detail.is_empty() {
                carried += 1;
            }
            book.detail.merge(previous.detail.clone());
        }
    }
    carried
}

/// Fill detail fields, fetching only cache misses.
pub async fn enrich_details(
    books: &mut [Book],
    index: &SnapshotIndex,
    fetcher: &dyn PageFetcher,
    parser: &DetailParser,
    delay: Duration,
) -> EnrichOutcome {
    let to_fetch = apply_cache(books, index);
    let mut outcome = EnrichOutcome {
        cached: books.len() - to_fetch.len(),
        ..EnrichOutcome::default()
    };

    if to_fetch.is_empty() {
        log::info!("All {} books served from detail cache", books.len());
        return outcome;
    }
    log::info!(
        "Fetching details for {} books ({} cached)",
        to_fetch.len(),
        outcome.cached
    );

    let total = to_fetch.len();
    for (n, &i) in to_fetch.iter().enumerate() {
        if n > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let book = &mut books[i];
        log::info!("  [{}/{}] {}", n + 1, total, truncate(book.title(), 40));

        match fetcher.fetch(book.url()).await {
            Ok(html) => {
                book.detail.merge(parser.parse_detail_page(&html));
                outcome.fetched += 1;
            }
            Err(e) => {
                log::warn!("Detail fetch failed for {} ({}): {}", book.title(), book.url(), e);
                outcome.failures.push(DetailFailure {
                    title: book.title().to_string(),
                    url: book.url().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    outcome
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
