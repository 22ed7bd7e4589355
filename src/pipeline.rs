// src/pipeline.rs
//! Per-page capability trait: what a worker does with a page it fetched.
//!
//! Both callbacks run on the worker that fetched the page, in order,
//! before that worker takes its next task. Neither can fail the crawl:
//! implementations log their own problems.

use crate::api::FetchedPage;

#[async_trait::async_trait]
pub trait PageHandler: Send + Sync {
    /// Receives the raw response.
    async fn on_response(&self, page: &FetchedPage);

    /// Receives the same response as a document; returns how many records it produced.
    fn on_document(&self, page: &FetchedPage) -> usize;
}
