// src/models/mod.rs

//! Domain models for the crawler.
//!
//! Book records flow through the pipeline; configuration drives it.

mod book;
mod config;

// Re-export all public types
pub use book::{Book, BookDetail, BookSummary};
pub use config::{
    Config, CrawlerConfig, PathsConfig, PipelineConfig, RecencyConfig, SiteConfig,
};
