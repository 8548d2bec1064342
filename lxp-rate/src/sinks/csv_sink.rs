//! Local CSV sink
//!
//! Each row is encoded into a buffer first and appended with a single
//! `write_all` on an append-mode handle, so rows from concurrent sessions do
//! not interleave. The header is written when the file is new or empty.
//! Appends are serialized by a lock shared between clones of the sink and
//! run on the blocking pool.

use super::{ProfileLayout, RecordLayout, ResultSink, SinkError};
use crate::models::{ProfileRecord, ResultRecord};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Appends result and profile rows to two CSV files
#[derive(Debug, Clone)]
pub struct CsvSink {
    results_path: PathBuf,
    profiles_path: PathBuf,
    /// Held from the header check to the end of the write
    write_lock: Arc<Mutex<()>>,
}

/// Header plus the most recent rows of a table
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TableTail {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvSink {
    pub fn new(results_path: PathBuf, profiles_path: PathBuf) -> Self {
        Self {
            results_path,
            profiles_path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    pub fn profiles_path(&self) -> &Path {
        &self.profiles_path
    }

    /// Last `limit` result rows; empty when the file does not exist yet
    pub fn tail_results(&self, limit: usize) -> Result<TableTail, SinkError> {
        if !self.results_path.exists() {
            return Ok(TableTail::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.results_path)?;
        let columns = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        let start = rows.len().saturating_sub(limit);

        Ok(TableTail {
            columns,
            rows: rows.split_off(start),
        })
    }

    async fn append(&self, path: &Path, header: &[String], row: Vec<String>) -> Result<(), SinkError> {
        let _guard = self.write_lock.lock().await;
        let path = path.to_path_buf();
        let header = header.to_vec();

        tokio::task::spawn_blocking(move || append_row(&path, &header, &row))
            .await
            .map_err(|e| SinkError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}

/// Append one row, writing `header` first if the file is new or empty
fn append_row(path: &Path, header: &[String], row: &[String]) -> Result<(), SinkError> {
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let mut buffer = Vec::new();
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(&mut buffer);
        if needs_header {
            writer.write_record(header)?;
        }
        writer.write_record(row)?;
        writer.flush()?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&buffer)?;

    tracing::debug!(path = %path.display(), header = needs_header, "Appended row");
    Ok(())
}

#[async_trait]
impl ResultSink for CsvSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn append_result(&self, layout: &RecordLayout, record: &ResultRecord) -> Result<(), SinkError> {
        self.append(&self.results_path, layout.header(), layout.row(record))
            .await
    }

    async fn append_profile(&self, layout: &ProfileLayout, record: &ProfileRecord) -> Result<(), SinkError> {
        self.append(&self.profiles_path, layout.header(), layout.row(record))
            .await
    }
}
