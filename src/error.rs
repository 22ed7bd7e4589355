// src/error.rs
//! Application error types with structured error handling.
//!
//! Failures fall into two families. [`AppError`] is fatal: the run cannot
//! continue and the binary exits with a failure status. [`FetchError`] is
//! contained to a single page: the worker logs it and moves on.
//! [`DiscoveryError`] explains why no pages could be planned and always
//! surfaces as [`AppError::Discovery`].

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a single request did not produce a page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{url} is outside the allowed domain {allowed}")]
    ForbiddenDomain { url: String, allowed: String },

    #[error("{url} was already visited in this run")]
    AlreadyVisited { url: String },

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    /// Whether the request was refused before reaching the network.
    ///
    /// Skips are expected during a crawl and are not counted as failures.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::ForbiddenDomain { .. } | Self::AlreadyVisited { .. })
    }

    /// Builds a transport error from a reqwest failure, keeping timeouts typed.
    pub fn from_reqwest(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Why the page count could not be determined.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("catalog root could not be fetched: {0}")]
    Fetch(#[source] FetchError),

    #[error("no '{selector}' navigation link with an href on {url}")]
    LinkMissing { url: String, selector: &'static str },

    #[error("last-page link '{href}' is not a valid URL: {source}")]
    MalformedHref {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("last-page link '{href}' carries no page parameter")]
    PageParamMissing { href: String },

    #[error("last-page link '{href}' has a non-numeric page '{value}'")]
    PageParamInvalid { href: String, value: String },

    #[error("last-page link '{href}' reports zero pages")]
    ZeroPages { href: String },
}

/// Main application error type. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Data root {} is not available: {source}", path.display())]
    DataRootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create session directory {}: {source}", path.display())]
    SessionDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV record to {}: {source}", path.display())]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to flush {}: {source}", path.display())]
    ResultWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Task queue is full: capacity {capacity}, rejected task for page {page}")]
    QueueCapacity { capacity: usize, page: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError {
            message: format!("background task failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_are_not_failures() {
        let visited = FetchError::AlreadyVisited {
            url: "https://hobbygames.ru/catalog-all?page=1".to_string(),
        };
        let forbidden = FetchError::ForbiddenDomain {
            url: "https://example.com/".to_string(),
            allowed: "hobbygames.ru".to_string(),
        };
        let status = FetchError::HttpStatus {
            url: "https://hobbygames.ru/catalog-all".to_string(),
            status: 503,
        };

        assert!(visited.is_skip());
        assert!(forbidden.is_skip());
        assert!(!status.is_skip());
    }

    #[test]
    fn fetch_errors_carry_full_detail() {
        let err = FetchError::Transport {
            url: "https://hobbygames.ru/catalog-all?page=7".to_string(),
            message: "connection reset by peer".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "request to https://hobbygames.ru/catalog-all?page=7 failed: connection reset by peer"
        );
    }

    #[test]
    fn discovery_errors_wrap_into_app_errors() {
        let err: AppError = DiscoveryError::ZeroPages {
            href: "?page=0".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Discovery(DiscoveryError::ZeroPages { .. })));
        assert_eq!(
            err.to_string(),
            "Page discovery failed: last-page link '?page=0' reports zero pages"
        );
    }
}
