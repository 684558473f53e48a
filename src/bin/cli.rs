//! bookwatch CLI
//!
//! Crawls the recent-arrivals listing and maintains the book snapshot.

use std::path::PathBuf;

use bookwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, PipelineOptions},
    services::{Digest, MailCredentials, RecencyWindow},
    storage::{LocalStorage, SnapshotStorage},
    utils::http::HttpFetcher,
};
use chrono::Utc;
use clap::{Parser, Subcommand};

/// bookwatch - Bookstore recent arrivals tracker
#[derive(Parser, Debug)]
#[command(name = "bookwatch", version, about = "Bookstore recent arrivals tracker")]
struct Cli {
    /// Directory holding config.toml and the snapshot files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the listing, mark new books, enrich, and save the snapshot
    Crawl {
        /// Skip detail page fetches (previously known detail is kept)
        #[arg(long)]
        skip_details: bool,
    },

    /// Show the recency-filtered digest handed to the renderer and notifier
    Digest {
        /// Override the recency window in days
        #[arg(long)]
        days: Option<u32>,
    },

    /// Validate configuration file
    Validate,

    /// Show current snapshot info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let storage = LocalStorage::new(&cli.storage_dir, &config.paths);

    match cli.command {
        Command::Crawl { skip_details } => {
            config.validate()?;

            let mut options = PipelineOptions::from(&config);
            if skip_details {
                log::info!("Skipping detail fetches (--skip-details)");
                options.enrich_details = false;
            }

            let fetcher = HttpFetcher::new(&config.crawler)?;
            let report = pipeline::run_pipeline(&config, &fetcher, &storage, options).await?;

            log::info!(
                "Saved {} books ({} new) to {}",
                report.write.book_count,
                report.new_count,
                report.write.location
            );
            if !report.failures.is_empty() {
                log::warn!(
                    "{} books are missing detail this run",
                    report.failures.len()
                );
            }
        }

        Command::Digest { days } => {
            config.validate()?;

            let books = match storage.load_snapshot().await {
                Ok(Some(books)) => books,
                Ok(None) => {
                    log::error!(
                        "No snapshot at {}. Run 'crawl' first.",
                        storage.snapshot_path().display()
                    );
                    return Err(AppError::config("Snapshot not found"));
                }
                Err(e) => return Err(e),
            };

            let mut window = RecencyWindow::from(&config.recency);
            if let Some(days) = days {
                window.days = days;
            }
            let digest = Digest::build(&books, window, Utc::now())?;

            log::info!(
                "Digest at {}: {} of {} books within {} days (since {}), {} new",
                digest.generated_at.format("%Y-%m-%d %H:%M"),
                digest.books.len(),
                books.len(),
                digest.window.days,
                digest.cutoff,
                digest.new_count
            );
            for book in &digest.books {
                let marker = if book.is_new { "[NEW] " } else { "" };
                log::info!("    {}{} {}", marker, book.title(), book.url());
            }

            match MailCredentials::from_env() {
                Some(credentials) => log::info!(
                    "Notification ready for {} recipient(s)",
                    credentials.recipients().len()
                ),
                None => log::warn!(
                    "Missing {}, {} or {}; skipping notification",
                    MailCredentials::TO_VAR,
                    MailCredentials::FROM_VAR,
                    MailCredentials::PASSWORD_VAR
                ),
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!("    start URL: {}", config.site.start_url()?);
            log::info!("    request delay: {}ms", config.crawler.request_delay_ms);
            log::info!("    timeout: {}s", config.crawler.timeout_secs);
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());
            log::info!(
                "Backup: {}",
                if storage.backup_path().exists() {
                    "exists"
                } else {
                    "not found"
                }
            );

            match storage.load_snapshot().await {
                Ok(Some(books)) => {
                    let new_count = books.iter().filter(|b| b.is_new).count();
                    let enriched = books.iter().filter(|b| b.detail.has_author()).count();
                    log::info!("Snapshot: {} books", books.len());
                    log::info!("    new: {}", new_count);
                    log::info!("    with detail: {}", enriched);
                }
                Ok(None) => log::info!("No snapshot found yet."),
                Err(e) => log::warn!("{}", e),
            }
        }
    }

    Ok(())
}
