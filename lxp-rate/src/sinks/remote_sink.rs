//! Remote spreadsheet-style append sink
//!
//! POSTs one JSON document per row:
//!
//! ```json
//! {"sheet": "results", "header": ["timestamp", ...], "row": ["2026-...", ...]}
//! ```
//!
//! The endpoint (e.g. a spreadsheet web-app script) owns append semantics and
//! write serialization. No retries: a failure is reported to the caller.

use super::{ProfileLayout, RecordLayout, ResultSink, SinkError};
use crate::models::{ProfileRecord, ResultRecord};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const USER_AGENT: &str = concat!("lxp-rate/", env!("CARGO_PKG_VERSION"));

pub const RESULTS_SHEET: &str = "results";
pub const PROFILES_SHEET: &str = "participants";

#[derive(Debug, Serialize)]
struct AppendRequest<'a> {
    sheet: &'a str,
    header: &'a [String],
    row: Vec<String>,
}

/// HTTP append client
#[derive(Debug, Clone)]
pub struct RemoteSink {
    http_client: reqwest::Client,
    url: String,
}

impl RemoteSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SinkError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, request: &AppendRequest<'_>) -> Result<(), SinkError> {
        tracing::debug!(url = %self.url, sheet = request.sheet, "Appending remote row");

        let response = self
            .http_client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| SinkError::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Status(status.as_u16(), body));
        }
        Ok(())
    }
}

#[async_trait]
impl ResultSink for RemoteSink {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn append_result(&self, layout: &RecordLayout, record: &ResultRecord) -> Result<(), SinkError> {
        self.post(&AppendRequest {
            sheet: RESULTS_SHEET,
            header: layout.header(),
            row: layout.row(record),
        })
        .await
    }

    async fn append_profile(&self, layout: &ProfileLayout, record: &ProfileRecord) -> Result<(), SinkError> {
        self.post(&AppendRequest {
            sheet: PROFILES_SHEET,
            header: layout.header(),
            row: layout.row(record),
        })
        .await
    }
}
