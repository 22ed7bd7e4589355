// src/config.rs
use crate::constants::{
    CACHE_DIR_NAME, CATALOG_DOMAIN, CATALOG_PARAMETER_TYPE, CATALOG_ROOT_URL, DATA_ROOT,
    FLUSH_INTERVAL, MAX_WORKER_COUNT, REQUEST_TIMEOUT, RESULTS_PER_PAGE, TASK_QUEUE_CAPACITY,
    WORKER_COUNT,
};
use crate::error::AppError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Root data directory holding every session and the response cache
    #[arg(short = 'd', long, global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Launch a new scraping session
    Start {
        /// Number of concurrent page workers
        #[arg(long, default_value_t = WORKER_COUNT)]
        workers: usize,

        /// Seconds between two flushes of accumulated records
        #[arg(long, default_value_t = FLUSH_INTERVAL.as_secs())]
        flush_interval: u64,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = REQUEST_TIMEOUT.as_secs())]
        timeout: u64,

        /// Bypass the on-disk response cache
        #[arg(long, default_value_t = false)]
        no_cache: bool,
    },
    /// Clean data folder
    Clean,
}

/// Resolved crawl configuration, validated and ready to drive a session.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub data_root: PathBuf,
    pub catalog_url: Url,
    pub allowed_domain: String,
    pub results_per_page: u32,
    pub workers: usize,
    pub queue_capacity: usize,
    pub request_timeout: Duration,
    pub flush_interval: Duration,
    pub use_cache: bool,
}

impl CrawlConfig {
    /// Design constants for crawling `catalog_url`.
    pub fn for_catalog(catalog_url: Url) -> Self {
        Self {
            data_root: PathBuf::from(DATA_ROOT),
            catalog_url,
            allowed_domain: CATALOG_DOMAIN.to_string(),
            results_per_page: RESULTS_PER_PAGE,
            workers: WORKER_COUNT,
            queue_capacity: TASK_QUEUE_CAPACITY,
            request_timeout: REQUEST_TIMEOUT,
            flush_interval: FLUSH_INTERVAL,
            use_cache: true,
        }
    }

    /// Design constants for the hobbygames.ru catalog.
    pub fn from_constants() -> Result<Self, AppError> {
        let catalog_url = Url::parse(CATALOG_ROOT_URL).map_err(|e| {
            AppError::InvalidConfiguration(format!(
                "catalog root {} is not a valid URL: {}",
                CATALOG_ROOT_URL, e
            ))
        })?;
        Ok(Self::for_catalog(catalog_url))
    }

    /// Resolves a complete configuration from CLI input.
    pub fn resolve(cli: &CommandLineInput) -> Result<Self, AppError> {
        let mut config = Self::from_constants()?;

        if let Some(dir) = &cli.data_dir {
            if dir.trim().is_empty() {
                return Err(AppError::InvalidConfiguration(
                    "data directory cannot be empty".to_string(),
                ));
            }
            config.data_root = PathBuf::from(dir);
        }

        if let Command::Start {
            workers,
            flush_interval,
            timeout,
            no_cache,
        } = &cli.command
        {
            if *flush_interval == 0 {
                return Err(AppError::InvalidConfiguration(
                    "flush interval must be at least one second".to_string(),
                ));
            }
            if *timeout == 0 {
                return Err(AppError::InvalidConfiguration(
                    "request timeout must be at least one second".to_string(),
                ));
            }
            if *workers > MAX_WORKER_COUNT {
                log::warn!(
                    "Requested {} workers exceeds the maximum of {}. Clamping.",
                    workers,
                    MAX_WORKER_COUNT
                );
            }
            config.workers = (*workers).clamp(1, MAX_WORKER_COUNT);
            config.flush_interval = Duration::from_secs(*flush_interval);
            config.request_timeout = Duration::from_secs(*timeout);
            config.use_cache = !no_cache;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the crawl relies on.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.catalog_url.host_str() {
            Some(host) if host == self.allowed_domain => {}
            other => {
                return Err(AppError::InvalidConfiguration(format!(
                    "catalog host {:?} is not the allowed domain {}",
                    other, self.allowed_domain
                )))
            }
        }
        if self.results_per_page == 0 {
            return Err(AppError::InvalidConfiguration(
                "results per page must be positive".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(AppError::InvalidConfiguration(
                "task queue capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory of the transport-level response cache.
    pub fn cache_dir(&self) -> PathBuf {
        self.data_root.join(CACHE_DIR_NAME)
    }

    /// The single request used to discover the page count.
    pub fn discovery_url(&self) -> Url {
        let mut url = self.catalog_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("results_per_page", &self.results_per_page.to_string());
        url
    }

    /// URL of one catalog page, `page` counted from 1.
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.catalog_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string())
            .append_pair("results_per_page", &self.results_per_page.to_string())
            .append_pair("parameter_type", &CATALOG_PARAMETER_TYPE.to_string());
        url
    }
}
