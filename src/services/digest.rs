// src/services/digest.rs

//! Hand-off to the page renderer and the mail notifier.
//!
//! Both collaborators consume the same recency-filtered view of the
//! snapshot. Filtering never touches the persisted snapshot itself.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Book, RecencyConfig};

/// Age threshold by publication date, evaluated in the site's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecencyWindow {
    pub days: u32,
    pub utc_offset_hours: i32,
}

impl RecencyWindow {
    pub fn new(days: u32, utc_offset_hours: i32) -> Self {
        Self {
            days,
            utc_offset_hours,
        }
    }

    fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::config(format!("invalid UTC offset: {}h", self.utc_offset_hours))
            })
    }

    /// Local time for `now`.
    pub fn local_time(&self, now: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
        Ok(now.with_timezone(&self.offset()?))
    }

    /// Oldest publication date still inside the window, as `YYYY-MM-DD`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<String> {
        let local = self.local_time(now)?;
        let start = Duration::try_days(i64::from(self.days))
            .and_then(|window| local.checked_sub_signed(window))
            .ok_or_else(|| {
                AppError::config(format!("recency window of {} days is out of range", self.days))
            })?;
        Ok(start.format("%Y-%m-%d").to_string())
    }
}

impl From<&RecencyConfig> for RecencyWindow {
    fn from(config: &RecencyConfig) -> Self {
        Self::new(config.window_days, config.utc_offset_hours)
    }
}

/// Keep books published on or after `cutoff`, plus every book whose date is
/// unknown.
pub fn filter_recent<'a>(books: &'a [Book], cutoff: &str) -> Vec<&'a Book> {
    books
        .iter()
        .filter(|book| match book.date_published() {
            Some(date) => date >= cutoff,
            None => true,
        })
        .collect()
}

/// Input for the renderer and the notifier.
#[derive(Debug, Clone, Serialize)]
pub struct Digest {
    pub generated_at: DateTime<FixedOffset>,
    pub window: RecencyWindow,
    pub cutoff: String,
    pub new_count: usize,
    pub books: Vec<Book>,
}

impl Digest {
    pub fn build(books: &[Book], window: RecencyWindow, now: DateTime<Utc>) -> Result<Self> {
        let cutoff = window.cutoff(now)?;
        let books: Vec<Book> = filter_recent(books, &cutoff)
            .into_iter()
            .cloned()
            .collect();
        let new_count = books.iter().filter(|b| b.is_new).count();

        Ok(Self {
            generated_at: window.local_time(now)?,
            window,
            cutoff,
            new_count,
            books,
        })
    }
}

/// Mail relay credentials from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct MailCredentials {
    pub to: String,
    pub from: String,
    pub password: String,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("to", &self.to)
            .field("from", &self.from)
            .field("password", &"***")
            .finish()
    }
}

impl MailCredentials {
    pub const TO_VAR: &'static str = "EMAIL_TO";
    pub const FROM_VAR: &'static str = "EMAIL_FROM";
    pub const PASSWORD_VAR: &'static str = "EMAIL_PASSWORD";

    /// Read credentials from the process environment.
    ///
    /// Returns `None` when any value is missing or blank; callers skip
    /// delivery in that case.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            to: get(Self::TO_VAR)?,
            from: get(Self::FROM_VAR)?,
            password: get(Self::PASSWORD_VAR)?,
        })
    }

    /// Comma-separated recipient list.
    pub fn recipients(&self) -> Vec<&str> {
        self.to
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .collect()
    }
}
