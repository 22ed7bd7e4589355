// src/constants.rs
//! Domain constants that define the operational boundaries of the crawler.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you how a crawl
//! runs: where it starts, how wide it fans out, how often it flushes.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Target site
// ---------------------------------------------------------------------------

/// The paginated listing endpoint for every product on the site.
pub const CATALOG_ROOT_URL: &str = "https://hobbygames.ru/catalog-all";

/// The only host the crawler is allowed to talk to.
pub const CATALOG_DOMAIN: &str = "hobbygames.ru";

/// How many products the catalog renders per page.
pub const RESULTS_PER_PAGE: u32 = 200;

/// Value of the `parameter_type` query parameter the catalog expects.
pub const CATALOG_PARAMETER_TYPE: u32 = 0;

/// Identifies the crawler to the target site.
pub const USER_AGENT: &str = concat!("catalog-scraper/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Page structure
// ---------------------------------------------------------------------------

/// The pagination control pointing at the highest page number.
pub const LAST_PAGE_SELECTOR: &str = ".last";

/// One product card on a catalog page.
pub const PRODUCT_BLOCK_SELECTOR: &str = "div.product-item";

/// Anchor inside a product card carrying `title` and `href`.
pub const PRODUCT_LINK_SELECTOR: &str = "div.name-desc > a";

/// Short description inside a product card.
pub const PRODUCT_DESC_SELECTOR: &str = "div.name-desc > div.desc";

/// Container whose children carry players/time/age in their `title`.
pub const PRODUCT_PARAMS_SELECTOR: &str = "div.params";

pub const PLAYERS_PARAM_CLASS: &str = "params__item players";
pub const GAME_TIME_PARAM_CLASS: &str = "params__item time";
pub const AGE_PARAM_CLASS: &str = "params__item age";

// ---------------------------------------------------------------------------
// Crawl boundaries
// ---------------------------------------------------------------------------

/// Number of workers draining the task queue concurrently.
pub const WORKER_COUNT: usize = 3;

/// Upper bound on workers a user may request.
pub const MAX_WORKER_COUNT: usize = 32;

/// Maximum number of page tasks the queue may hold at once.
///
/// Exceeding it means the discovered page count is implausible for this
/// site, so planning fails instead of silently dropping pages.
pub const TASK_QUEUE_CAPACITY: usize = 10_000;

/// Upper bound on a single page fetch, including reading the body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How often accumulated items are written to the result file.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// On-disk layout
// ---------------------------------------------------------------------------

/// Root directory holding every session and the response cache.
pub const DATA_ROOT: &str = "./data";

/// Response cache directory, relative to the data root.
pub const CACHE_DIR_NAME: &str = "cache";

/// `chrono` format for session directory names (`2023-05-14_093012`).
pub const SESSION_DIR_FORMAT: &str = "%Y-%m-%d_%H%M%S";

pub const RESULT_FILE_NAME: &str = "result.csv";
pub const HEADER_FILE_NAME: &str = "header.csv";

/// Extension of raw page snapshots.
pub const SNAPSHOT_EXTENSION: &str = "htm";

/// Stem used for snapshots of URLs with an empty path.
pub const SNAPSHOT_FALLBACK_STEM: &str = "index";

/// Snapshot stems are cut at this many bytes.
pub const SNAPSHOT_STEM_MAX_LEN: usize = 100;
