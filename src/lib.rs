// src/lib.rs
//! catalog-scraper library: crawls a paginated product catalog into CSV.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `DiscoveryError`, `FetchError`
//! - **Configuration**: `CommandLineInput`, `CrawlConfig`
//! - **Domain model**: `Item` and its CSV column list
//! - **Transport**: `Fetcher`, `HttpFetcher`, `CachedFetcher`, `ScopedFetcher`
//! - **Documents**: `DocumentReader`, `NodeReader`, `HtmlDocument`
//! - **Crawl**: `Crawler`, `DiscoveryProbe`, `TaskQueue`, `WorkerPool`
//! - **Session**: `Session`, `ResultWriter`, the flush loop, `clear_all_data`

pub mod api;
pub mod config;
pub mod constants;
pub mod crawl;
pub mod document;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod session;

// --- Error Handling ---
pub use crate::error::{AppError, DiscoveryError, FetchError};

// --- Configuration ---
pub use crate::config::{Command, CommandLineInput, CrawlConfig};

// --- Domain Model ---
pub use crate::model::{Item, CSV_COLUMNS};

// --- Transport ---
pub use crate::api::{CachedFetcher, DiskCache, FetchedPage, Fetcher, HttpFetcher, ScopedFetcher};

// --- Documents ---
pub use crate::document::{DocumentReader, HtmlDocument, HtmlNode, NodeReader};

// --- Crawl ---
pub use crate::crawl::{
    extract_item, extract_items, last_page_href, parse_page_count, plan_page_tasks, CrawlReport,
    Crawler, DiscoveryProbe, ExtractionCallback, PageTask, PoolReport, TaskOutcome, TaskQueue,
    WorkerPool,
};

// --- Session ---
pub use crate::session::{clear_all_data, run_flush_loop, FlushSummary, ResultWriter, Session};

// --- Pipeline Traits ---
pub use crate::pipeline::PageHandler;
