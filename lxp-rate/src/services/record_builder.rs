//! Result and profile record assembly
//!
//! Pure functions: no I/O. Persisting the records is the sinks' job.

use crate::models::{
    PhaseResult, ProfileAnswer, ProfileQuestion, ProfileRecord, RatingScale, ResultRecord,
    ScaleError, Session,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Source of record timestamps
pub trait TimestampSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimestampSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        lxp_common::time::now()
    }
}

/// Clock frozen at one instant, for reproducible records
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimestampSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Record could not be assembled from the session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("No current trial: session is complete")]
    NoCurrentTrial,

    /// Final submission attempted before every phase was rated
    #[error("Phase '{label}' has not been rated")]
    MissingPhaseRating { label: String },

    /// Out-of-range rating reached the builder; the range is enforced upstream
    #[error("Rating out of range: {0}")]
    OutOfRange(#[from] ScaleError),
}

/// Participant-profile submission rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Participant id is required")]
    MissingParticipant,

    #[error("No answer for question '{0}'")]
    MissingAnswer(String),

    #[error("'{answer}' is not a choice for question '{question}'")]
    InvalidChoice { question: String, answer: String },

    #[error("Unknown question '{0}'")]
    UnknownQuestion(String),
}

/// Assemble the record for the session's current trial
///
/// Requires every phase of the current trial to be rated. Notes are trimmed.
pub fn build_record(
    session: &Session,
    notes: Option<&str>,
    scale: &RatingScale,
    clock: &dyn TimestampSource,
) -> Result<ResultRecord, RecordError> {
    let trial = session.current().ok_or(RecordError::NoCurrentTrial)?;

    let phases = trial
        .phases
        .iter()
        .zip(session.phase_progress())
        .map(|(phase, progress)| {
            let ratings = progress.ratings.ok_or_else(|| RecordError::MissingPhaseRating {
                label: phase.label.clone(),
            })?;
            scale.check(&ratings)?;
            Ok(PhaseResult {
                label: phase.label.clone(),
                filename: phase.file.filename.clone(),
                ratings,
                play_count: progress.play_count,
            })
        })
        .collect::<Result<Vec<_>, RecordError>>()?;

    Ok(ResultRecord {
        participant_id: session.participant_id().to_string(),
        timestamp: clock.now(),
        session_started_at: session.started_at(),
        block: trial.block.clone(),
        item_key: trial.key.clone(),
        trial_index: session.position(),
        phases,
        notes: notes.map(str::trim).unwrap_or_default().to_string(),
    })
}

/// Validate questionnaire answers and assemble a profile record
///
/// Every configured question needs an answer drawn from its choices; answers
/// to unknown questions are rejected.
pub fn build_profile(
    questions: &[ProfileQuestion],
    participant_id: &str,
    answers: &BTreeMap<String, String>,
    free_text: Option<&str>,
    clock: &dyn TimestampSource,
) -> Result<ProfileRecord, ProfileError> {
    let participant_id = participant_id.trim();
    if participant_id.is_empty() {
        return Err(ProfileError::MissingParticipant);
    }

    if let Some(unknown) = answers.keys().find(|k| !questions.iter().any(|q| &q.id == *k)) {
        return Err(ProfileError::UnknownQuestion(unknown.clone()));
    }

    let answers = questions
        .iter()
        .map(|question| {
            let answer = answers
                .get(&question.id)
                .ok_or_else(|| ProfileError::MissingAnswer(question.id.clone()))?;
            if !question.choices.contains(answer) {
                return Err(ProfileError::InvalidChoice {
                    question: question.id.clone(),
                    answer: answer.clone(),
                });
            }
            Ok(ProfileAnswer {
                question: question.id.clone(),
                answer: answer.clone(),
            })
        })
        .collect::<Result<Vec<_>, ProfileError>>()?;

    Ok(ProfileRecord {
        participant_id: participant_id.to_string(),
        timestamp: clock.now(),
        answers,
        free_text: free_text.map(str::trim).unwrap_or_default().to_string(),
    })
}
