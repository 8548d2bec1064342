//! Local-then-remote delivery
//!
//! The local write must succeed; its error goes to the caller and the remote
//! sink is not attempted. A remote failure after a successful local write is
//! logged and returned in the [`Delivery`] report. There is no transaction
//! across the two sinks, so a remote failure leaves the remote table missing
//! a row that the local file has.

use super::{ProfileLayout, RecordLayout, ResultSink, SinkError};
use crate::models::{ProfileRecord, ResultRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// What happened at the remote sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum RemoteOutcome {
    Disabled,
    Delivered,
    Failed(String),
}

/// Delivery report for one row (the local write always succeeded)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub remote: RemoteOutcome,
}

impl Delivery {
    /// Remote failure message, if any
    pub fn remote_error(&self) -> Option<&str> {
        match &self.remote {
            RemoteOutcome::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Local sink plus optional remote sink
#[derive(Clone)]
pub struct DualSink {
    local: Arc<dyn ResultSink>,
    remote: Option<Arc<dyn ResultSink>>,
}

impl DualSink {
    pub fn new(local: Arc<dyn ResultSink>, remote: Option<Arc<dyn ResultSink>>) -> Self {
        Self { local, remote }
    }

    pub async fn deliver_result(
        &self,
        layout: &RecordLayout,
        record: &ResultRecord,
    ) -> Result<Delivery, SinkError> {
        self.local.append_result(layout, record).await?;

        let remote = match &self.remote {
            None => RemoteOutcome::Disabled,
            Some(sink) => match sink.append_result(layout, record).await {
                Ok(()) => RemoteOutcome::Delivered,
                Err(e) => {
                    warn!(
                        sink = sink.name(),
                        participant_id = %record.participant_id,
                        item_key = %record.item_key,
                        "Remote write failed (local write succeeded): {}",
                        e
                    );
                    RemoteOutcome::Failed(e.to_string())
                }
            },
        };

        Ok(Delivery { remote })
    }

    pub async fn deliver_profile(
        &self,
        layout: &ProfileLayout,
        record: &ProfileRecord,
    ) -> Result<Delivery, SinkError> {
        self.local.append_profile(layout, record).await?;

        let remote = match &self.remote {
            None => RemoteOutcome::Disabled,
            Some(sink) => match sink.append_profile(layout, record).await {
                Ok(()) => RemoteOutcome::Delivered,
                Err(e) => {
                    warn!(
                        sink = sink.name(),
                        participant_id = %record.participant_id,
                        "Remote profile write failed (local write succeeded): {}",
                        e
                    );
                    RemoteOutcome::Failed(e.to_string())
                }
            },
        };

        Ok(Delivery { remote })
    }
}
