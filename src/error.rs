// src/error.rs

//! Unified error handling for the bookwatch crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Connection, timeout, or body-read fault while talking to the site
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The site answered with a non-success status
    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// Structured data could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// The previous snapshot exists but could not be read or decoded
    #[error("Failed to load snapshot {path}: {message}")]
    StateLoad { path: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regex compilation failed
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create a snapshot load error.
    pub fn state_load(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::StateLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a transport error for the given URL.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Whether this error came from the network layer (transport or status).
    pub fn is_fetch_error(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_names_url() {
        let err = AppError::HttpStatus {
            url: "https://example.com/zh_tw/recent".to_string(),
            status: 503,
        };
        let msg = err.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("https://example.com/zh_tw/recent"));
        assert!(err.is_fetch_error());
    }

    #[test]
    fn test_state_load_is_not_fetch_error() {
        let err = AppError::state_load("books.json", "expected value at line 1");
        assert!(!err.is_fetch_error());
        assert!(err.to_string().contains("books.json"));
    }
}
