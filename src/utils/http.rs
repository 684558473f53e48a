// src/utils/http.rs

//! HTTP client utilities.
//!
//! All outbound traffic goes through a [`PageFetcher`]. The production
//! implementation is [`HttpFetcher`], built from an explicit
//! [`CrawlerConfig`] rather than any process-wide session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

/// Maximum redirect hops followed per request.
const MAX_REDIRECTS: usize = 10;

/// Fetches one document per call. No caching, no retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the response body.
    ///
    /// Fails with [`AppError::Transport`] on connection/timeout faults and
    /// [`AppError::HttpStatus`] on a non-success status.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("invalid value for header {name}: {e}")))?;
        headers.insert(name, value);
    }

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()?;
    Ok(client)
}

/// Page fetcher backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| AppError::transport(url, e))
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! In-memory fetcher for pipeline tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves canned bodies by URL and records every request.
    #[derive(Default)]
    pub struct StubFetcher {
        pages: HashMap<String, std::result::Result<String, u16>>,
        requests: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), Ok(body.into()));
            self
        }

        pub fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(url.to_string(), Err(status));
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn clear_requests(&self) {
            self.requests.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(AppError::HttpStatus {
                    url: url.to_string(),
                    status: *status,
                }),
                None => Err(AppError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }
}
