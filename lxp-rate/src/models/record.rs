//! Result records handed to sinks

use super::rating::Ratings;
use super::stimulus::ItemKey;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Ratings and playback count for one phase of a completed trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseResult {
    pub label: String,
    pub filename: String,
    pub ratings: Ratings,
    pub play_count: u32,
}

/// One row per completed trial. Immutable and append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub participant_id: String,
    pub timestamp: DateTime<Utc>,
    pub session_started_at: DateTime<Utc>,
    pub block: String,
    pub item_key: ItemKey,
    /// Zero-based position of the trial in the presentation order
    pub trial_index: usize,
    pub phases: Vec<PhaseResult>,
    pub notes: String,
}
