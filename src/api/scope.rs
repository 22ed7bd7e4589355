// src/api/scope.rs
//! Crawl rules enforced at the transport level.
//!
//! [`ScopedFetcher`] refuses requests to other hosts before they are sent,
//! optionally refuses URLs already requested in this run, and bounds every
//! request by a timeout.

use super::{FetchedPage, Fetcher};
use crate::error::FetchError;
use dashmap::DashSet;
use std::time::Duration;
use url::Url;

pub struct ScopedFetcher<F> {
    inner: F,
    allowed_domain: String,
    timeout: Option<Duration>,
    visited: Option<DashSet<String>>,
}

impl<F: Fetcher> ScopedFetcher<F> {
    /// Restricts `inner` to URLs whose host is exactly `allowed_domain`.
    pub fn new(inner: F, allowed_domain: impl Into<String>) -> Self {
        Self {
            inner,
            allowed_domain: allowed_domain.into(),
            timeout: None,
            visited: None,
        }
    }

    /// Bounds each request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Refuses any exact URL that was already requested through this fetcher.
    pub fn without_revisits(mut self) -> Self {
        self.visited = Some(DashSet::new());
        self
    }

    /// Number of distinct URLs requested so far (0 when revisits are allowed).
    pub fn visited_count(&self) -> usize {
        self.visited.as_ref().map_or(0, |v| v.len())
    }

    fn is_allowed(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host.eq_ignore_ascii_case(&self.allowed_domain))
    }
}

#[async_trait::async_trait]
impl<F: Fetcher> Fetcher for ScopedFetcher<F> {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        if !self.is_allowed(url) {
            return Err(FetchError::ForbiddenDomain {
                url: url.to_string(),
                allowed: self.allowed_domain.clone(),
            });
        }

        if let Some(visited) = &self.visited {
            if !visited.insert(url.to_string()) {
                return Err(FetchError::AlreadyVisited {
                    url: url.to_string(),
                });
            }
        }

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.inner.fetch(url))
                .await
                .map_err(|_| FetchError::Timeout {
                    url: url.to_string(),
                    timeout,
                })?,
            None => self.inner.fetch(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubFetcher {
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl StubFetcher {
        fn new(calls: Arc<AtomicUsize>) -> Self {
            Self {
                calls,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait::async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(FetchedPage::ok(url.clone(), "<html></html>"))
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn other_domains_never_reach_the_network() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = ScopedFetcher::new(StubFetcher::new(calls.clone()), "hobbygames.ru");

        let err = fetcher
            .fetch(&url("https://evil.example.com/catalog-all"))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::ForbiddenDomain { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Subdomains are not the allowed domain either.
        let err = fetcher
            .fetch(&url("https://cdn.hobbygames.ru/catalog-all"))
            .await
            .unwrap_err();
        assert!(err.is_skip());
    }

    #[tokio::test]
    async fn revisits_are_refused_only_when_enabled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = url("https://hobbygames.ru/catalog-all?page=1");

        let permissive = ScopedFetcher::new(StubFetcher::new(calls.clone()), "hobbygames.ru");
        permissive.fetch(&page).await.unwrap();
        permissive.fetch(&page).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let strict = ScopedFetcher::new(StubFetcher::new(calls.clone()), "hobbygames.ru")
            .without_revisits();
        strict.fetch(&page).await.unwrap();
        let err = strict.fetch(&page).await.unwrap_err();

        assert!(matches!(err, FetchError::AlreadyVisited { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(strict.visited_count(), 1);

        // A different query string is a different URL.
        strict
            .fetch(&url("https://hobbygames.ru/catalog-all?page=2"))
            .await
            .unwrap();
        assert_eq!(strict.visited_count(), 2);
    }

    #[tokio::test]
    async fn slow_requests_time_out() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slow = StubFetcher {
            calls: calls.clone(),
            delay: Duration::from_secs(5),
        };
        let fetcher =
            ScopedFetcher::new(slow, "hobbygames.ru").with_timeout(Duration::from_millis(20));

        let err = fetcher
            .fetch(&url("https://hobbygames.ru/catalog-all?page=9"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FetchError::Timeout {
                url: "https://hobbygames.ru/catalog-all?page=9".to_string(),
                timeout: Duration::from_millis(20),
            }
        );
    }
}
