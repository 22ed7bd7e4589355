// src/api/mod.rs
//! Page transport: the ability to turn a URL into a response body.
//!
//! Orchestration depends on the [`Fetcher`] trait, never on HTTP details.
//! Layers compose by wrapping: [`ScopedFetcher`] enforces the crawl's
//! rules around a [`CachedFetcher`], which wraps the live [`HttpFetcher`].

pub mod cache;
pub mod client;
pub mod scope;

use crate::error::FetchError;
use std::borrow::Cow;
use std::sync::Arc;
use url::Url;

/// A successful response to a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// The URL that was requested (not the post-redirect URL).
    pub url: Url,
    pub status: u16,
    /// Response body exactly as received.
    pub body: Vec<u8>,
    pub from_cache: bool,
}

impl FetchedPage {
    /// A freshly fetched 200 response.
    pub fn ok(url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url,
            status: 200,
            body: body.into(),
            from_cache: false,
        }
    }

    /// The body as text for parsing. Invalid UTF-8 becomes U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// The ability to retrieve one page.
///
/// Implementations return `Err` for anything that did not yield a usable
/// body, including non-success HTTP statuses.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

#[async_trait::async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        (**self).fetch(url).await
    }
}

pub use cache::{CachedFetcher, DiskCache};
pub use client::HttpFetcher;
pub use scope::ScopedFetcher;
