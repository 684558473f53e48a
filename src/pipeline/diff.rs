//! Novelty detection against the previous snapshot.
//!
//! Books are keyed by canonical URL. A book is new iff its URL is absent
//! from the previous snapshot's index.

use std::collections::HashMap;

use crate::models::Book;

/// Previous snapshot indexed by URL.
#[derive(Debug, Clone, Default)]
pub struct SnapshotIndex {
    by_url: HashMap<String, Book>,
}

impl SnapshotIndex {
    /// An index with no prior state; every book is new against it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index a previous snapshot. Records without a URL are ignored; on
    /// duplicate URLs the last record wins.
    pub fn from_books(books: Vec<Book>) -> Self {
        let by_url = books
            .into_iter()
            .filter(|b| !b.url().is_empty())
            .map(|b| (b.url().to_string(), b))
            .collect();
        Self { by_url }
    }

    pub fn get(&self, url: &str) -> Option<&Book> {
        self.by_url.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.by_url.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

/// Set `is_new` on every book. Returns the number of new books.
pub fn mark_new(books: &mut [Book], index: &SnapshotIndex) -> usize {
    let mut new_count = 0;
    for book in books.iter_mut() {
        book.is_new = !index.contains(book.url());
        if book.is_new {
            new_count += 1;
        }
    }
    new_count
}
