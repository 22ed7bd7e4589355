// src/api/cache.rs
//! Disk-based response cache for page requests.
//!
//! Caches raw response bodies keyed by the full request URL. Each entry is
//! a JSON metadata file plus a body file holding the bytes as received.
//! Entries never expire, so a second run against the same data root
//! replays earlier responses instead of hitting the site again. `clean`
//! wipes them.

use super::{FetchedPage, Fetcher};
use crate::error::FetchError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

// ---------------------------------------------------------------------------
// Disk cache
// ---------------------------------------------------------------------------

/// File cache for raw response bodies.
///
/// Cache operations are best-effort: read/write failures are logged and
/// ignored so a broken cache never prevents a live request.
pub struct DiskCache {
    cache_dir: PathBuf,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct CacheEntry {
    url: String,
    status: u16,
    cached_at: u64,
}

impl DiskCache {
    /// Opens (creating if needed) a cache rooted at `cache_dir`.
    pub async fn open(cache_dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let cache_dir = cache_dir.into();
        tokio::fs::create_dir_all(&cache_dir).await?;
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the cached response for `url`, if any.
    pub async fn get(&self, url: &Url) -> Option<FetchedPage> {
        let (meta_path, body_path) = self.entry_paths(url);
        let content = tokio::fs::read_to_string(&meta_path).await.ok()?;
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Ignoring unreadable cache entry {}: {}", meta_path.display(), e);
                return None;
            }
        };
        // Hash collisions are possible; the stored URL is authoritative.
        if entry.url != url.as_str() {
            return None;
        }
        let body = match tokio::fs::read(&body_path).await {
            Ok(body) => body,
            Err(e) => {
                log::debug!("Ignoring cache entry without body {}: {}", body_path.display(), e);
                return None;
            }
        };
        Some(FetchedPage {
            url: url.clone(),
            status: entry.status,
            body,
            from_cache: true,
        })
    }

    /// Stores a response. Errors are logged and otherwise ignored.
    ///
    /// The body is written before the metadata, so a readable metadata
    /// file always has its body next to it.
    pub async fn set(&self, page: &FetchedPage) {
        let (meta_path, body_path) = self.entry_paths(&page.url);
        if let Err(e) = tokio::fs::write(&body_path, &page.body).await {
            log::warn!("Can't write cache body {}: {}", body_path.display(), e);
            return;
        }

        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let entry = CacheEntry {
            url: page.url.to_string(),
            status: page.status,
            cached_at,
        };
        match serde_json::to_string(&entry) {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&meta_path, json).await {
                    log::warn!("Can't write cache entry {}: {}", meta_path.display(), e);
                }
            }
            Err(e) => log::warn!("Can't encode cache entry for {}: {}", page.url, e),
        }
    }

    /// Metadata and body file of the entry for `url`.
    fn entry_paths(&self, url: &Url) -> (PathBuf, PathBuf) {
        let mut hasher = DefaultHasher::new();
        url.as_str().hash(&mut hasher);
        let key = format!("{:016x}", hasher.finish());
        (
            self.cache_dir.join(format!("{}.json", key)),
            self.cache_dir.join(format!("{}.body", key)),
        )
    }
}

// ---------------------------------------------------------------------------
// Cached fetcher
// ---------------------------------------------------------------------------

/// A [`Fetcher`] that serves repeated requests from a [`DiskCache`].
///
/// Only successful responses are stored; failures always reach the
/// inner transport again on the next request.
pub struct CachedFetcher<F> {
    inner: F,
    cache: DiskCache,
}

impl<F: Fetcher> CachedFetcher<F> {
    pub fn new(inner: F, cache: DiskCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl<F: Fetcher> Fetcher for CachedFetcher<F> {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        if let Some(cached) = self.cache.get(url).await {
            log::debug!("Cache hit: {}", url);
            return Ok(cached);
        }

        log::debug!("Cache miss: {}", url);
        let page = self.inner.fetch(url).await?;
        self.cache.set(&page).await;
        Ok(page)
    }
}
