// src/crawl/worker_pool.rs
//! Fixed-size pool of async workers draining a [`TaskQueue`].
//!
//! Each worker takes a task, fetches it, then runs both page callbacks
//! before taking the next one. A failed or skipped page is logged and
//! counted; it never stops the pool.

use super::task_queue::TaskQueue;
use super::tasks::{PageTask, TaskOutcome};
use crate::api::Fetcher;
use crate::constants::MAX_WORKER_COUNT;
use crate::error::AppError;
use crate::pipeline::PageHandler;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Per-page totals of one pool run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub pages_skipped: usize,
    pub items_extracted: usize,
    /// The run was cancelled with tasks still queued or in flight.
    pub cancelled: bool,
}

impl PoolReport {
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Processed { items, .. } => {
                self.pages_fetched += 1;
                self.items_extracted += items;
            }
            TaskOutcome::Skipped { .. } => self.pages_skipped += 1,
            TaskOutcome::Failed { .. } => self.pages_failed += 1,
        }
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            pages_fetched: self.pages_fetched + other.pages_fetched,
            pages_failed: self.pages_failed + other.pages_failed,
            pages_skipped: self.pages_skipped + other.pages_skipped,
            items_extracted: self.items_extracted + other.items_extracted,
            cancelled: self.cancelled || other.cancelled,
        }
    }
}

pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool of `workers` workers, clamped to `1..=MAX_WORKER_COUNT`.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.clamp(1, MAX_WORKER_COUNT),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs until the queue is drained and every in-flight task is done,
    /// or until `cancel` fires.
    ///
    /// Tasks are expected to be enqueued before the call; a worker that
    /// finds the queue empty exits. Only a worker that cannot be joined
    /// makes the run fail.
    pub async fn run<F, H>(
        &self,
        queue: Arc<TaskQueue>,
        fetcher: Arc<F>,
        handler: Arc<H>,
        cancel: CancellationToken,
    ) -> Result<PoolReport, AppError>
    where
        F: Fetcher + ?Sized + 'static,
        H: PageHandler + ?Sized + 'static,
    {
        log::info!(
            "Starting {} workers for {} queued pages",
            self.workers,
            queue.len()
        );

        let mut join_set = JoinSet::new();
        for worker_id in 0..self.workers {
            let queue = Arc::clone(&queue);
            let fetcher = Arc::clone(&fetcher);
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();

            join_set.spawn(async move {
                run_worker_loop(worker_id, &queue, &*fetcher, &*handler, &cancel).await
            });
        }

        let mut report = PoolReport::default();
        while let Some(result) = join_set.join_next().await {
            report = report.merge(result?);
        }
        report.cancelled = cancel.is_cancelled() && queue.has_pending_work();

        log::info!(
            "Worker pool finished: {} fetched, {} failed, {} skipped, {} items{}",
            report.pages_fetched,
            report.pages_failed,
            report.pages_skipped,
            report.items_extracted,
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }
}

async fn run_worker_loop<F, H>(
    worker_id: usize,
    queue: &TaskQueue,
    fetcher: &F,
    handler: &H,
    cancel: &CancellationToken,
) -> PoolReport
where
    F: Fetcher + ?Sized,
    H: PageHandler + ?Sized,
{
    let mut report = PoolReport::default();

    while !cancel.is_cancelled() {
        let Some(task) = queue.dequeue() else {
            log::debug!("Worker {} found no more work, exiting", worker_id);
            break;
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::debug!("Worker {} abandoned page {} on cancellation", worker_id, task.page);
                break;
            }
            outcome = process_task(&task, fetcher, handler) => outcome,
        };

        match &outcome {
            TaskOutcome::Processed { page, items } => {
                log::debug!("Worker {} processed page {}: {} items", worker_id, page, items);
            }
            TaskOutcome::Skipped { page, reason } => {
                log::debug!("Skipping page {}: {}", page, reason);
            }
            TaskOutcome::Failed { page, reason } => {
                log::warn!("got error on page {}: {}", page, reason);
            }
        }

        report.record(&outcome);
        queue.mark_completed();
    }

    report
}

async fn process_task<F, H>(task: &PageTask, fetcher: &F, handler: &H) -> TaskOutcome
where
    F: Fetcher + ?Sized,
    H: PageHandler + ?Sized,
{
    match fetcher.fetch(&task.url).await {
        Ok(page) => {
            handler.on_response(&page).await;
            let items = handler.on_document(&page);
            TaskOutcome::Processed {
                page: task.page,
                items,
            }
        }
        Err(reason) if reason.is_skip() => TaskOutcome::Skipped {
            page: task.page,
            reason,
        },
        Err(reason) => TaskOutcome::Failed {
            page: task.page,
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchedPage;
    use crate::config::CrawlConfig;
    use crate::crawl::tasks::plan_page_tasks;
    use crate::error::FetchError;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use url::Url;

    /// Answers by page number: 0 = HTTP 500, 1 = off-domain, else success.
    struct FakeSite {
        failing_page: u32,
        skipped_page: u32,
        delay: Duration,
    }

    fn page_of(url: &Url) -> u32 {
        url.query_pairs()
            .find(|(k, _)| k == "page")
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0)
    }

    #[async_trait::async_trait]
    impl Fetcher for FakeSite {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let page = page_of(url);
            if page == self.failing_page {
                return Err(FetchError::HttpStatus {
                    url: url.to_string(),
                    status: 500,
                });
            }
            if page == self.skipped_page {
                return Err(FetchError::AlreadyVisited {
                    url: url.to_string(),
                });
            }
            Ok(FetchedPage::ok(url.clone(), format!("page {}", page)))
        }
    }

    /// Records callback order and reports two items per page.
    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<(u32, &'static str)>>,
    }

    #[async_trait::async_trait]
    impl PageHandler for RecordingHandler {
        async fn on_response(&self, page: &FetchedPage) {
            self.events.lock().push((page_of(&page.url), "response"));
        }

        fn on_document(&self, page: &FetchedPage) -> usize {
            self.events.lock().push((page_of(&page.url), "document"));
            2
        }
    }

    fn seeded_queue(pages: u32) -> Arc<TaskQueue> {
        let queue = Arc::new(TaskQueue::with_capacity(100));
        queue
            .enqueue_all(plan_page_tasks(&CrawlConfig::from_constants().unwrap(), pages))
            .unwrap();
        queue
    }

    #[tokio::test]
    async fn failures_are_contained_to_their_page() {
        let queue = seeded_queue(10);
        let handler = Arc::new(RecordingHandler::default());
        let site = Arc::new(FakeSite {
            failing_page: 4,
            skipped_page: 7,
            delay: Duration::ZERO,
        });

        let report = WorkerPool::new(3)
            .run(Arc::clone(&queue), site, Arc::clone(&handler), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            report,
            PoolReport {
                pages_fetched: 8,
                pages_failed: 1,
                pages_skipped: 1,
                items_extracted: 16,
                cancelled: false,
            }
        );
        assert!(queue.is_empty());
        assert!(!queue.has_pending_work());

        // Each page's response callback precedes its document callback.
        let events = handler.events.lock();
        assert_eq!(events.len(), 16);
        for page in (1..=10).filter(|p| *p != 4 && *p != 7) {
            let response = events.iter().position(|e| *e == (page, "response")).unwrap();
            let document = events.iter().position(|e| *e == (page, "document")).unwrap();
            assert!(response < document);
        }
    }

    #[tokio::test]
    async fn cancellation_stops_the_pool_promptly() {
        let queue = seeded_queue(50);
        let handler = Arc::new(RecordingHandler::default());
        let site = Arc::new(FakeSite {
            failing_page: 0,
            skipped_page: 0,
            delay: Duration::from_secs(30),
        });
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            WorkerPool::new(3).run(Arc::clone(&queue), site, handler, cancel),
        )
        .await
        .expect("pool should stop on cancellation")
        .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.pages_fetched, 0);
        assert_eq!(queue.len(), 47);
    }

    #[test]
    fn worker_count_is_clamped() {
        assert_eq!(WorkerPool::new(0).workers(), 1);
        assert_eq!(WorkerPool::new(3).workers(), 3);
        assert_eq!(WorkerPool::new(1_000).workers(), MAX_WORKER_COUNT);
    }
}
