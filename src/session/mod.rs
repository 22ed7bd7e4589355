// src/session/mod.rs
//! One crawl run's output: its directory, its pending records and the
//! background writer that makes them durable.
//!
//! Workers only ever call [`Session::append_item`] and
//! [`Session::snapshot_path`]; the flush loop is the only reader of the
//! buffer and the only writer of `result.csv`.

mod clean;
mod paths;
mod state;
mod writer;

pub use clean::clear_all_data;
pub use paths::{sanitize_filename, session_dir_name, snapshot_file_name};
pub use state::Session;
pub use writer::{run_flush_loop, FlushSummary, ResultWriter};
