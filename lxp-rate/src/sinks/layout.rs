//! Tabular column layouts for result and profile rows

use super::SinkError;
use crate::models::{ProfileQuestion, ProfileRecord, ResultRecord};
use lxp_common::time::to_iso8601;
use std::collections::HashMap;

const BASE_COLUMNS: [&str; 6] = [
    "timestamp",
    "participant_id",
    "session_started_at",
    "block",
    "item_key",
    "trial_index",
];

const PHASE_FIELDS: [&str; 5] = ["filename", "valence", "arousal", "difficulty", "play_count"];

const NOTES_COLUMN: &str = "notes";

/// Profile columns filled from the record itself rather than from answers
pub const PROFILE_RESERVED_COLUMNS: [&str; 3] = ["participant_id", "timestamp", "free_text"];

/// Result table columns
///
/// The full column set is the base columns, then `{slot}_{field}` for every
/// phase slot, then `notes`. A configured subset selects and orders columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    slots: Vec<String>,
    columns: Vec<String>,
}

impl RecordLayout {
    /// Layout with every column for the given phase slots
    pub fn new(slots: Vec<String>) -> Self {
        let columns = Self::all_columns(&slots);
        Self { slots, columns }
    }

    /// Restrict to `selected` columns, in that order
    pub fn with_columns(mut self, selected: &[String]) -> Result<Self, SinkError> {
        let all = Self::all_columns(&self.slots);
        if selected.is_empty() {
            return Err(SinkError::Layout("Column selection is empty".to_string()));
        }
        if let Some(unknown) = selected.iter().find(|c| !all.contains(c)) {
            return Err(SinkError::Layout(format!(
                "Unknown column '{}'; available: {}",
                unknown,
                all.join(", ")
            )));
        }
        self.columns = selected.to_vec();
        Ok(self)
    }

    fn all_columns(slots: &[String]) -> Vec<String> {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for slot in slots {
            columns.extend(PHASE_FIELDS.iter().map(|f| format!("{}_{}", slot, f)));
        }
        columns.push(NOTES_COLUMN.to_string());
        columns
    }

    pub fn header(&self) -> &[String] {
        &self.columns
    }

    /// Row values in header order
    ///
    /// Phases map to slots by position; a slot without a phase is left blank.
    pub fn row(&self, record: &ResultRecord) -> Vec<String> {
        let mut values: HashMap<String, String> = HashMap::new();
        values.insert("timestamp".to_string(), to_iso8601(&record.timestamp));
        values.insert("participant_id".to_string(), record.participant_id.clone());
        values.insert(
            "session_started_at".to_string(),
            to_iso8601(&record.session_started_at),
        );
        values.insert("block".to_string(), record.block.clone());
        values.insert("item_key".to_string(), record.item_key.to_string());
        values.insert("trial_index".to_string(), record.trial_index.to_string());

        for (slot, phase) in self.slots.iter().zip(&record.phases) {
            let fields = [
                phase.filename.clone(),
                phase.ratings.valence.to_string(),
                phase.ratings.arousal.to_string(),
                phase.ratings.difficulty.to_string(),
                phase.play_count.to_string(),
            ];
            for (field, value) in PHASE_FIELDS.iter().zip(fields) {
                values.insert(format!("{}_{}", slot, field), value);
            }
        }
        values.insert(NOTES_COLUMN.to_string(), record.notes.clone());

        self.columns
            .iter()
            .map(|c| values.remove(c).unwrap_or_default())
            .collect()
    }
}

/// Participant-profile table columns: id, timestamp, one per question, free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLayout {
    columns: Vec<String>,
}

impl ProfileLayout {
    pub fn new(questions: &[ProfileQuestion]) -> Self {
        let mut columns = vec!["participant_id".to_string(), "timestamp".to_string()];
        columns.extend(questions.iter().map(|q| q.id.clone()));
        columns.push("free_text".to_string());
        Self { columns }
    }

    pub fn header(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self, record: &ProfileRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column.as_str() {
                "participant_id" => record.participant_id.clone(),
                "timestamp" => to_iso8601(&record.timestamp),
                "free_text" => record.free_text.clone(),
                question => record
                    .answers
                    .iter()
                    .find(|a| a.question == question)
                    .map(|a| a.answer.clone())
                    .unwrap_or_default(),
            })
            .collect()
    }
}
