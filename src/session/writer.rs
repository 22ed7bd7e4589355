// src/session/writer.rs
//! Makes accumulated items durable.
//!
//! This module is the only place where `result.csv` and `header.csv` are
//! written. [`run_flush_loop`] is the single consumer of the session
//! buffer; it owns the [`ResultWriter`] for its whole life.

use super::Session;
use crate::constants::{HEADER_FILE_NAME, RESULT_FILE_NAME};
use crate::error::AppError;
use crate::model::{Item, CSV_COLUMNS};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Append-only CSV sink for a session's items.
pub struct ResultWriter {
    result_path: PathBuf,
    records: csv::Writer<File>,
}

impl ResultWriter {
    /// Opens `result.csv` for appending and rewrites `header.csv`.
    ///
    /// The header row goes into `result.csv` only when the file is empty,
    /// so reopening an existing session never duplicates it.
    pub fn open(session_dir: &Path) -> Result<Self, AppError> {
        let header_path = session_dir.join(HEADER_FILE_NAME);
        write_header_file(&header_path)?;

        let result_path = session_dir.join(RESULT_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&result_path)
            .map_err(|source| AppError::OutputFile {
                path: result_path.clone(),
                source,
            })?;
        let is_empty = file
            .metadata()
            .map_err(|source| AppError::OutputFile {
                path: result_path.clone(),
                source,
            })?
            .len()
            == 0;

        // Header rows are written explicitly, never inferred from a batch.
        let mut writer = Self {
            records: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(file),
            result_path,
        };
        if is_empty {
            writer.write_row(&CSV_COLUMNS)?;
            writer.flush()?;
        }
        Ok(writer)
    }

    pub fn result_path(&self) -> &Path {
        &self.result_path
    }

    /// Appends one row per item, then flushes to the file.
    pub fn write_batch(&mut self, items: &[Item]) -> Result<usize, AppError> {
        for item in items {
            self.records
                .serialize(item)
                .map_err(|source| AppError::CsvWrite {
                    path: self.result_path.clone(),
                    source,
                })?;
        }
        self.flush()?;
        Ok(items.len())
    }

    fn write_row(&mut self, row: &[&str]) -> Result<(), AppError> {
        self.records
            .write_record(row)
            .map_err(|source| AppError::CsvWrite {
                path: self.result_path.clone(),
                source,
            })
    }

    fn flush(&mut self) -> Result<(), AppError> {
        self.records
            .flush()
            .map_err(|source| AppError::ResultWrite {
                path: self.result_path.clone(),
                source,
            })
    }
}

fn write_header_file(path: &Path) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|source| AppError::OutputFile {
            path: path.to_path_buf(),
            source,
        })?;
    let mut header = csv::Writer::from_writer(file);
    header
        .write_record(CSV_COLUMNS)
        .map_err(|source| AppError::CsvWrite {
            path: path.to_path_buf(),
            source,
        })?;
    header.flush().map_err(|source| AppError::ResultWrite {
        path: path.to_path_buf(),
        source,
    })
}

/// What the flush loop wrote over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushSummary {
    pub batches: usize,
    pub rows: usize,
}

/// Drains `session` into `writer` every `interval` until `stop` fires.
///
/// Once `stop` is observed the buffer is drained one final time before
/// the loop returns, so every item appended before that point reaches
/// the file. A write failure ends the loop with the error; whatever the
/// caller does next, the data already drained cannot be retried.
pub async fn run_flush_loop(
    session: Arc<Session>,
    mut writer: ResultWriter,
    interval: Duration,
    stop: CancellationToken,
) -> Result<FlushSummary, AppError> {
    let mut summary = FlushSummary::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => {
                flush_pending(&session, &mut writer, &mut summary)?;
                log::info!(
                    "Flush loop stopped: {} rows in {} batches written to {}",
                    summary.rows,
                    summary.batches,
                    writer.result_path().display()
                );
                return Ok(summary);
            }
            _ = ticker.tick() => {
                flush_pending(&session, &mut writer, &mut summary)?;
            }
        }
    }
}

fn flush_pending(
    session: &Session,
    writer: &mut ResultWriter,
    summary: &mut FlushSummary,
) -> Result<(), AppError> {
    let batch = session.drain();
    if batch.is_empty() {
        return Ok(());
    }

    let started = Instant::now();
    let written = writer.write_batch(&batch)?;
    summary.batches += 1;
    summary.rows += written;

    log::info!(
        "flush data: {} records in {}ms",
        written,
        started.elapsed().as_millis()
    );
    Ok(())
}
