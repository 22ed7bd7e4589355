// src/session/paths.rs
//! Pure functions for session and snapshot naming.
//!
//! No I/O happens here.

use crate::constants::{
    SESSION_DIR_FORMAT, SNAPSHOT_EXTENSION, SNAPSHOT_FALLBACK_STEM, SNAPSHOT_STEM_MAX_LEN,
};
use chrono::{DateTime, TimeZone};
use url::Url;

/// Directory name of a session started at `started_at`.
pub fn session_dir_name<Tz>(started_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    started_at.format(SESSION_DIR_FORMAT).to_string()
}

/// Snapshot file name for the `file_num`-th response of a session.
///
/// The request path becomes the stem: `/catalog-all` gives
/// `catalog-all_3.htm`, `/a/b` gives `a_b_3.htm`. The number keeps names
/// unique even when many pages share one path.
pub fn snapshot_file_name(url: &Url, file_num: u64) -> String {
    let path = url.path().trim_matches('/');
    let stem = if path.is_empty() {
        SNAPSHOT_FALLBACK_STEM.to_string()
    } else {
        sanitize_filename(&path.replace('/', "_"))
    };
    format!("{}_{}.{}", stem, file_num, SNAPSHOT_EXTENSION)
}

/// Sanitizes a string to be safe for use as a filename.
pub fn sanitize_filename(name: &str) -> String {
    let mut safe_name = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>();

    safe_name = safe_name.trim().trim_matches('.').to_string();

    if safe_name.len() > SNAPSHOT_STEM_MAX_LEN {
        let mut cut = SNAPSHOT_STEM_MAX_LEN;
        while !safe_name.is_char_boundary(cut) {
            cut -= 1;
        }
        safe_name.truncate(cut);
    }

    if safe_name.is_empty() {
        safe_name = SNAPSHOT_FALLBACK_STEM.to_string();
    }

    safe_name
}
