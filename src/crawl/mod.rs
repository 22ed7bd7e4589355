// src/crawl/mod.rs
//! Crawl orchestration.
//!
//! A run goes through two phases. [`DiscoveryProbe`] issues one request
//! to learn the page count, then one [`PageTask`] per page is queued and a
//! [`WorkerPool`] drains the queue with an [`ExtractionCallback`] wired to
//! the run's [`Session`]. The session's flush loop runs beside the pool
//! for the whole run and performs the terminal flush after the pool stops.

mod discovery;
mod extraction;
mod task_queue;
mod tasks;
mod worker_pool;

pub use discovery::{last_page_href, parse_page_count, DiscoveryProbe};
pub use extraction::{extract_item, extract_items, ExtractionCallback};
pub use task_queue::TaskQueue;
pub use tasks::{plan_page_tasks, PageTask, TaskOutcome};
pub use worker_pool::{PoolReport, WorkerPool};

use crate::api::{CachedFetcher, DiskCache, Fetcher, HttpFetcher, ScopedFetcher};
use crate::config::CrawlConfig;
use crate::error::AppError;
use crate::session::{run_flush_loop, FlushSummary, ResultWriter, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What one crawl run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub session_dir: PathBuf,
    /// Pages announced by discovery (0 if cancelled before it finished).
    pub page_count: u32,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub pages_skipped: usize,
    pub items_extracted: usize,
    pub rows_written: usize,
    pub batches: usize,
    /// The run stopped on cancellation before finishing its pages.
    pub cancelled: bool,
}

impl CrawlReport {
    fn new(session_dir: PathBuf, page_count: u32, pool: PoolReport, flush: FlushSummary) -> Self {
        Self {
            session_dir,
            page_count,
            pages_fetched: pool.pages_fetched,
            pages_failed: pool.pages_failed,
            pages_skipped: pool.pages_skipped,
            items_extracted: pool.items_extracted,
            rows_written: flush.rows,
            batches: flush.batches,
            cancelled: pool.cancelled,
        }
    }
}

/// Runs crawl sessions against one transport.
pub struct Crawler {
    config: CrawlConfig,
    transport: Arc<dyn Fetcher>,
}

impl Crawler {
    /// Uses `transport` for every request. Domain scoping, revisit
    /// suppression and timeouts are layered on top of it by the crawler.
    pub fn new(config: CrawlConfig, transport: Arc<dyn Fetcher>) -> Self {
        Self { config, transport }
    }

    /// Builds the live HTTP transport, behind the response cache unless
    /// the configuration disables it.
    ///
    /// The data root must already exist; opening the cache never creates it.
    pub async fn connect(config: CrawlConfig) -> Result<Self, AppError> {
        tokio::fs::metadata(&config.data_root)
            .await
            .map_err(|source| AppError::DataRootUnavailable {
                path: config.data_root.clone(),
                source,
            })?;

        let http = HttpFetcher::new(config.request_timeout)?;
        let transport: Arc<dyn Fetcher> = if config.use_cache {
            let cache = DiskCache::open(config.cache_dir()).await?;
            log::debug!("Response cache at {}", cache.dir().display());
            Arc::new(CachedFetcher::new(http, cache))
        } else {
            log::debug!("Response cache disabled");
            Arc::new(http)
        };
        Ok(Self::new(config, transport))
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Runs one full crawl session.
    ///
    /// Returns once every page was processed or `cancel` fired, and in
    /// both cases only after the terminal flush has written every item
    /// extracted so far. Session bootstrap, discovery and result-file
    /// failures abort the run with an error.
    pub async fn start(&self, cancel: CancellationToken) -> Result<CrawlReport, AppError> {
        let session = Arc::new(Session::create(&self.config.data_root)?);
        let writer = ResultWriter::open(session.data_path())?;

        // Stopped only after the pool has, so the terminal drain sees every item.
        let flush_stop = CancellationToken::new();
        let mut flush = tokio::spawn(run_flush_loop(
            Arc::clone(&session),
            writer,
            self.config.flush_interval,
            flush_stop.clone(),
        ));

        let pool_cancel = cancel.child_token();
        let crawl = self.crawl(Arc::clone(&session), pool_cancel.clone());
        tokio::pin!(crawl);

        let (crawl_result, flush_result) = tokio::select! {
            result = &mut crawl => {
                flush_stop.cancel();
                (result, (&mut flush).await)
            }
            flushed = &mut flush => {
                log::error!("Flush loop ended early, stopping the crawl");
                pool_cancel.cancel();
                (crawl.await, flushed)
            }
        };

        let summary = flush_result??;
        let (page_count, pool) = crawl_result?;

        let report = CrawlReport::new(session.data_path().to_path_buf(), page_count, pool, summary);
        log::info!("finished: {:?}", report);
        Ok(report)
    }

    async fn crawl(
        &self,
        session: Arc<Session>,
        cancel: CancellationToken,
    ) -> Result<(u32, PoolReport), AppError> {
        let probe_transport = ScopedFetcher::new(
            Arc::clone(&self.transport),
            self.config.allowed_domain.clone(),
        )
        .with_timeout(self.config.request_timeout);
        let probe = DiscoveryProbe::new(&probe_transport, &self.config);

        let page_count = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::info!("Cancelled before discovery finished");
                let pool = PoolReport {
                    cancelled: true,
                    ..Default::default()
                };
                return Ok((0, pool));
            }
            count = probe.page_count() => count?,
        };

        let queue = Arc::new(TaskQueue::with_capacity(self.config.queue_capacity));
        queue.enqueue_all(plan_page_tasks(&self.config, page_count))?;
        log::info!("queue filled. current size {}", queue.len());

        let pool_transport = Arc::new(
            ScopedFetcher::new(
                Arc::clone(&self.transport),
                self.config.allowed_domain.clone(),
            )
            .with_timeout(self.config.request_timeout)
            .without_revisits(),
        );
        let handler = Arc::new(ExtractionCallback::new(session));

        let pool = WorkerPool::new(self.config.workers)
            .run(queue, pool_transport, handler, cancel)
            .await?;
        Ok((page_count, pool))
    }
}
