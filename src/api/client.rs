// src/api/client.rs
//! Live HTTP transport.
//!
//! A thin wrapper around reqwest. It performs GET requests and classifies
//! the outcome; scoping, caching and revisit rules live in other layers.

use super::{FetchedPage, Fetcher};
use crate::constants::USER_AGENT;
use crate::error::{AppError, FetchError};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A reqwest-backed [`Fetcher`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a client whose requests are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), self.timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), self.timeout, e))?
            .to_vec();

        log::debug!("{} -> {} ({} bytes)", url, status, body.len());

        Ok(FetchedPage {
            url: url.clone(),
            status: status.as_u16(),
            body,
            from_cache: false,
        })
    }
}
