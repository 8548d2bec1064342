//! Participant session state machine
//!
//! Sequencer states: `Ready(i)` for `0 <= i < total`, then `Done` (terminal).
//! Within the current trial, phases progress `Awaiting(0) → Awaiting(1) → … →
//! Complete`. A phase can only be rated after it has been played at least once.
//!
//! Every transition takes `&Session` and returns a new `Session`, so the
//! caller decides when a transition is committed.

use super::rating::Ratings;
use super::trial::Trial;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Rejected session transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Queue exhausted
    #[error("Session complete: no current trial")]
    Exhausted,

    #[error("Phase {0} does not exist in the current trial")]
    UnknownPhase(usize),

    /// Phase is after the one awaiting a rating
    #[error("Phase {0} is locked until the preceding phases are rated")]
    PhaseLocked(usize),

    /// Rating submitted before playback
    #[error("Phase {0} must be played before it can be rated")]
    NotUnlocked(usize),

    #[error("All phases of the current trial are already rated")]
    TrialComplete,
}

/// Position in the presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "position", rename_all = "snake_case")]
pub enum SequencerState {
    Ready(usize),
    Done,
}

/// Progress through the phases of the current trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "phase", rename_all = "snake_case")]
pub enum PhaseCursor {
    Awaiting(usize),
    Complete,
}

/// Transient per-phase state, reset whenever the session advances
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseProgress {
    pub play_count: u32,
    pub ratings: Option<Ratings>,
}

impl PhaseProgress {
    pub fn is_unlocked(&self) -> bool {
        self.play_count >= 1
    }
}

/// One participant's pass through an ordered trial sequence
#[derive(Debug, Clone)]
pub struct Session {
    participant_id: String,
    started_at: DateTime<Utc>,
    order_seed: u64,
    trials: Arc<[Trial]>,
    position: usize,
    phases: Vec<PhaseProgress>,
}

impl Session {
    /// Create a session over trials already in presentation order
    pub fn new(
        participant_id: impl Into<String>,
        started_at: DateTime<Utc>,
        order_seed: u64,
        trials: Vec<Trial>,
    ) -> Self {
        let trials: Arc<[Trial]> = trials.into();
        let phases = fresh_progress(trials.first());
        Self {
            participant_id: participant_id.into(),
            started_at,
            order_seed,
            trials,
            position: 0,
            phases,
        }
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Seed that produced the presentation order
    pub fn order_seed(&self) -> u64 {
        self.order_seed
    }

    /// Trials in presentation order
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn total(&self) -> usize {
        self.trials.len()
    }

    pub fn remaining(&self) -> usize {
        self.total() - self.position
    }

    pub fn state(&self) -> SequencerState {
        if self.position < self.trials.len() {
            SequencerState::Ready(self.position)
        } else {
            SequencerState::Done
        }
    }

    pub fn is_done(&self) -> bool {
        self.state() == SequencerState::Done
    }

    /// Current trial, or `None` once the queue is exhausted
    pub fn current(&self) -> Option<&Trial> {
        self.trials.get(self.position)
    }

    /// Per-phase state of the current trial
    pub fn phase_progress(&self) -> &[PhaseProgress] {
        &self.phases
    }

    /// `None` once the session is done
    pub fn cursor(&self) -> Option<PhaseCursor> {
        self.current()?;
        Some(
            self.phases
                .iter()
                .position(|p| p.ratings.is_none())
                .map(PhaseCursor::Awaiting)
                .unwrap_or(PhaseCursor::Complete),
        )
    }

    /// Count one playback of `phase`, unlocking it for rating
    ///
    /// Allowed for the awaiting phase and any already-rated phase (replays).
    pub fn record_play(&self, phase: usize) -> Result<Session, SessionError> {
        let trial = self.current().ok_or(SessionError::Exhausted)?;
        if phase >= trial.phase_count() {
            return Err(SessionError::UnknownPhase(phase));
        }
        if let Some(PhaseCursor::Awaiting(awaiting)) = self.cursor() {
            if phase > awaiting {
                return Err(SessionError::PhaseLocked(phase));
            }
        }

        let mut next = self.clone();
        next.phases[phase].play_count += 1;
        Ok(next)
    }

    /// Rate the awaiting phase
    ///
    /// Range checking is the caller's job (see `RatingScale::check`); this
    /// enforces ordering and the play-before-rate gate.
    pub fn submit_rating(&self, ratings: Ratings) -> Result<Session, SessionError> {
        let awaiting = match self.cursor() {
            None => return Err(SessionError::Exhausted),
            Some(PhaseCursor::Complete) => return Err(SessionError::TrialComplete),
            Some(PhaseCursor::Awaiting(i)) => i,
        };
        if !self.phases[awaiting].is_unlocked() {
            return Err(SessionError::NotUnlocked(awaiting));
        }

        let mut next = self.clone();
        next.phases[awaiting].ratings = Some(ratings);
        Ok(next)
    }

    /// Move to the next trial
    ///
    /// Does not check that the current trial was recorded; callers advance only
    /// after a record has been emitted. At `Done` this is a no-op.
    pub fn advance(&self) -> Session {
        if self.is_done() {
            return self.clone();
        }
        let mut next = self.clone();
        next.position += 1;
        next.phases = fresh_progress(next.trials.get(next.position));
        next
    }
}

fn fresh_progress(trial: Option<&Trial>) -> Vec<PhaseProgress> {
    trial
        .map(|t| vec![PhaseProgress::default(); t.phase_count()])
        .unwrap_or_default()
}
