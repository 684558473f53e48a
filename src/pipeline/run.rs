// src/pipeline/run.rs

//! One full run: `START → LIST_CRAWL → DIFF → ENRICH → PERSIST → DONE`.
//!
//! Only a listing failure is fatal; it ends in `FAILED` without touching the
//! stored snapshot. Detail failures are reported and the run still succeeds.

use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::models::{Book, Config};
use crate::pipeline::crawl::crawl_listing;
use crate::pipeline::diff::{SnapshotIndex, mark_new};
use crate::pipeline::enrich::{DetailFailure, carry_forward, enrich_details};
use crate::services::{DetailParser, ListParser};
use crate::storage::{SnapshotStorage, WriteMetadata};
use crate::utils::http::PageFetcher;

/// Stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Start,
    ListCrawl,
    Diff,
    Enrich,
    Persist,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Start => "START",
            RunStage::ListCrawl => "LIST_CRAWL",
            RunStage::Diff => "DIFF",
            RunStage::Enrich => "ENRICH",
            RunStage::Persist => "PERSIST",
            RunStage::Done => "DONE",
            RunStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Optional stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Mark books absent from the previous snapshot as new
    pub track_novelty: bool,
    /// Fetch details for cache misses; when false, only carry known detail
    pub enrich_details: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            track_novelty: true,
            enrich_details: true,
        }
    }
}

impl From<&Config> for PipelineOptions {
    fn from(config: &Config) -> Self {
        Self {
            track_novelty: config.pipeline.track_novelty,
            enrich_details: config.pipeline.enrich_details,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stage: RunStage,
    pub total: usize,
    pub new_count: usize,
    pub cached: usize,
    pub fetched: usize,
    pub failures: Vec<DetailFailure>,
    pub write: WriteMetadata,
    pub books: Vec<Book>,
}

/// Run the crawl-diff-enrich pipeline and persist the result.
pub async fn run_pipeline(
    config: &Config,
    fetcher: &dyn PageFetcher,
    storage: &dyn SnapshotStorage,
    options: PipelineOptions,
) -> Result<RunReport> {
    let delay = Duration::from_millis(config.crawler.request_delay_ms);
    let list_parser = ListParser::new(&config.site)?;
    let detail_parser = DetailParser::new(&config.site)?;
    let start_url = config.site.start_url()?;

    enter(RunStage::Start);
    let index = load_previous(storage).await;

    enter(RunStage::ListCrawl);
    let summaries = match crawl_listing(fetcher, &list_parser, &start_url, delay).await {
        Ok(summaries) => summaries,
        Err(e) => {
            enter(RunStage::Failed);
            log::error!("Listing crawl failed, snapshot left untouched: {}", e);
            return Err(e);
        }
    };
    let mut books: Vec<Book> = summaries.into_iter().map(Book::from).collect();

    enter(RunStage::Diff);
    let new_count = if options.track_novelty {
        let count = mark_new(&mut books, &index);
        log::info!("{} of {} books are new", count, books.len());
        count
    } else {
        log::info!("Novelty tracking disabled");
        0
    };

    enter(RunStage::Enrich);
    let (cached, fetched, failures) = if options.enrich_details {
        let outcome = enrich_details(&mut books, &index, fetcher, &detail_parser, delay).await;
        (outcome.cached, outcome.fetched, outcome.failures)
    } else {
        let carried = carry_forward(&mut books, &index);
        log::info!("Detail fetch skipped; carried known detail for {} books", carried);
        (carried, 0, Vec::new())
    };

    enter(RunStage::Persist);
    let backed_up = storage.backup_snapshot().await?;
    let mut write = storage.write_snapshot(&books).await?;
    write.backed_up = backed_up;

    enter(RunStage::Done);
    log::info!(
        "Run complete: {} books, {} new, {} cached, {} fetched, {} detail failures",
        books.len(),
        new_count,
        cached,
        fetched,
        failures.len()
    );
    for failure in &failures {
        log::warn!("    detail missing: {} ({})", failure.title, failure.url);
    }

    Ok(RunReport {
        stage: RunStage::Done,
        total: books.len(),
        new_count,
        cached,
        fetched,
        failures,
        write,
        books,
    })
}

fn enter(stage: RunStage) {
    log::info!("[{}]", stage);
}

/// Load the previous snapshot; unreadable state counts as no state.
async fn load_previous(storage: &dyn SnapshotStorage) -> SnapshotIndex {
    match storage.load_snapshot().await {
        Ok(Some(books)) => {
            let index = SnapshotIndex::from_books(books);
            log::info!("Loaded previous snapshot with {} books", index.len());
            index
        }
        Ok(None) => {
            log::info!("No previous snapshot; every book will be new");
            SnapshotIndex::empty()
        }
        Err(e) => {
            log::warn!("{}; treating every book as new", e);
            SnapshotIndex::empty()
        }
    }
}
