//! Append-only persistence targets for result and profile records
//!
//! The local CSV sink is authoritative. The remote sink is an additional
//! durability hedge; see [`DualSink`] for how the two are combined.

pub mod csv_sink;
pub mod dual;
pub mod layout;
pub mod remote_sink;

pub use csv_sink::CsvSink;
pub use dual::{Delivery, DualSink, RemoteOutcome};
pub use layout::{ProfileLayout, RecordLayout};
pub use remote_sink::RemoteSink;

use crate::models::{ProfileRecord, ResultRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Network failure talking to the remote endpoint
    #[error("Remote sink error: {0}")]
    Remote(String),

    /// Remote endpoint answered with a non-success status
    #[error("Remote sink returned {0}: {1}")]
    Status(u16, String),

    /// Column configuration does not match the layout
    #[error("Layout error: {0}")]
    Layout(String),
}

/// Append-only table target
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    async fn append_result(&self, layout: &RecordLayout, record: &ResultRecord) -> Result<(), SinkError>;

    async fn append_profile(&self, layout: &ProfileLayout, record: &ProfileRecord) -> Result<(), SinkError>;
}
