// src/crawl/tasks.rs
//! Work items for the page worker pool.

use crate::config::CrawlConfig;
use crate::error::FetchError;

/// One catalog page to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    /// 1-based page index.
    pub page: u32,
    pub page_size: u32,
    pub url: url::Url,
}

impl PageTask {
    pub fn new(config: &CrawlConfig, page: u32) -> Self {
        Self {
            page,
            page_size: config.results_per_page,
            url: config.page_url(page),
        }
    }
}

/// Plans one task per page, `1..=page_count`, in page order.
pub fn plan_page_tasks(config: &CrawlConfig, page_count: u32) -> Vec<PageTask> {
    (1..=page_count)
        .map(|page| PageTask::new(config, page))
        .collect()
}

/// Result of processing one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The page was fetched and handed to the page handler.
    Processed { page: u32, items: usize },
    /// The transport refused the request without sending it.
    Skipped { page: u32, reason: FetchError },
    /// The request failed; the page is abandoned for this run.
    Failed { page: u32, reason: FetchError },
}
