//! Stimulus catalog summary

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{
    error::ApiResult,
    services::{
        pairing::{DuplicateKey, SkippedItem, UnmatchedFile},
        Catalog, SourceSummary,
    },
    AppState,
};

/// GET /api/stimuli response
#[derive(Debug, Serialize)]
pub struct StimuliSummary {
    pub sources: Vec<SourceSummary>,
    pub phase_slots: Vec<String>,
    pub trial_count: usize,
    /// Keys present in some but not all conditions
    pub skipped: Vec<SkippedItem>,
    /// Files whose names do not fit the key policy
    pub unmatched: Vec<UnmatchedFile>,
    pub duplicates: Vec<DuplicateKey>,
}

/// GET /api/stimuli
///
/// Scans the stimulus root with the configured design. A missing directory
/// or an empty trial set is reported as 422.
pub async fn stimuli_summary(State(state): State<AppState>) -> ApiResult<Json<StimuliSummary>> {
    let catalog = Catalog::load(
        &state.config.design,
        &state.config.stimulus_root,
        &state.scanner,
    )?;

    Ok(Json(StimuliSummary {
        trial_count: catalog.trial_count(),
        sources: catalog.sources,
        phase_slots: state.config.design.phase_slots(),
        skipped: catalog.grouping.skipped,
        unmatched: catalog.grouping.unmatched,
        duplicates: catalog.grouping.duplicates,
    }))
}

/// Build stimulus catalog routes
pub fn stimuli_routes() -> Router<AppState> {
    Router::new().route("/api/stimuli", get(stimuli_summary))
}
