//! Presentation order and session start
//!
//! Block order is fixed by the order blocks first appear in the trial set;
//! only the order of trials within each block is shuffled. Each block is
//! shuffled independently from one seeded `StdRng` stream, so the same seed
//! and trial set always give the same order.

use crate::models::{Session, Trial};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Start a session now
///
/// Without a seed, a fresh random seed is drawn and kept on the session
/// (`Session::order_seed`) so the presentation order can be reproduced later.
pub fn start_session(participant_id: impl Into<String>, trials: Vec<Trial>, seed: Option<u64>) -> Session {
    start_session_at(participant_id, trials, seed, lxp_common::time::now())
}

/// Start a session with an explicit start time
pub fn start_session_at(
    participant_id: impl Into<String>,
    trials: Vec<Trial>,
    seed: Option<u64>,
    started_at: DateTime<Utc>,
) -> Session {
    let seed = seed.unwrap_or_else(rand::random);
    let ordered = presentation_order(trials, seed);

    let participant_id = participant_id.into();
    tracing::info!(
        participant_id = %participant_id,
        seed,
        trials = ordered.len(),
        "Session started"
    );

    Session::new(participant_id, started_at, seed, ordered)
}

/// Shuffle trials within blocks, keeping block order
pub fn presentation_order(trials: Vec<Trial>, seed: u64) -> Vec<Trial> {
    let mut blocks: Vec<(String, Vec<Trial>)> = Vec::new();
    for trial in trials {
        if !trial.is_consistent() {
            tracing::warn!(trial = %trial.id(), "Dropping trial with no phases");
            continue;
        }
        match blocks.iter_mut().find(|(name, _)| *name == trial.block) {
            Some((_, items)) => items.push(trial),
            None => blocks.push((trial.block.clone(), vec![trial])),
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut ordered = Vec::new();
    for (block, mut items) in blocks {
        items.shuffle(&mut rng);
        tracing::debug!(block = %block, count = items.len(), "Shuffled block");
        ordered.extend(items);
    }
    ordered
}
