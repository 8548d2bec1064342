//! Participant session API handlers
//!
//! POST /api/sessions, GET /api/sessions/:id, and the per-trial
//! play / ratings / submit transitions.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{ItemKey, PhaseCursor, RatingScale, SequencerState, Session},
    services::{build_record, extract_key, start_session_at, Catalog, KeyPolicy},
    AppState,
};

const AUDIO_BASE: &str = "http://localhost/stimuli/";

/// POST /api/sessions request
#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Generated when absent or blank
    #[serde(default)]
    pub participant_id: Option<String>,
    /// Presentation-order seed; drawn at random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Restrict the session to these blocks; every block when absent
    #[serde(default)]
    pub blocks: Option<Vec<String>>,
}

/// POST /api/sessions/:id/play request
#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub phase: usize,
}

/// POST /api/sessions/:id/ratings request
///
/// Values are range-checked against the configured scale before use.
#[derive(Debug, Deserialize)]
pub struct RatingsRequest {
    pub valence: i64,
    pub arousal: i64,
    pub difficulty: i64,
}

/// POST /api/sessions/:id/submit request
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub remaining: usize,
}

/// Rating scale bounds; `midpoint` is the initial slider position
#[derive(Debug, Serialize)]
pub struct ScaleView {
    pub min: u8,
    pub max: u8,
    pub midpoint: u8,
}

impl From<RatingScale> for ScaleView {
    fn from(scale: RatingScale) -> Self {
        Self {
            min: scale.min,
            max: scale.max,
            midpoint: scale.midpoint(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PhaseView {
    pub index: usize,
    pub label: String,
    pub filename: String,
    pub audio_url: String,
    pub play_count: u32,
    pub unlocked: bool,
    pub rated: bool,
}

#[derive(Debug, Serialize)]
pub struct TrialView {
    pub block: String,
    pub item_key: ItemKey,
    /// Filename prefix before the first `_`
    pub scale_guess: Option<ItemKey>,
    pub cursor: PhaseCursor,
    pub phases: Vec<PhaseView>,
}

/// Session state as seen by the client
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub participant_id: String,
    pub started_at: DateTime<Utc>,
    pub order_seed: u64,
    pub state: SequencerState,
    pub progress: Progress,
    pub scale: ScaleView,
    /// `None` once every trial has been submitted
    pub current: Option<TrialView>,
}

/// POST /api/sessions/:id/submit response
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub session: SessionView,
    /// Item key of the trial just recorded
    pub recorded: ItemKey,
    /// Set when the local write succeeded but the remote sink failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_warning: Option<String>,
}

/// Build the client view of `session`
pub fn session_view(id: Uuid, session: &Session, state: &AppState) -> SessionView {
    let current = session.current().zip(session.cursor()).map(|(trial, cursor)| {
        let phases = trial
            .phases
            .iter()
            .zip(session.phase_progress())
            .enumerate()
            .map(|(index, (phase, progress))| PhaseView {
                index,
                label: phase.label.clone(),
                filename: phase.file.filename.clone(),
                audio_url: audio_url(&phase.file.relative_to(&state.config.stimulus_root)),
                play_count: progress.play_count,
                unlocked: progress.is_unlocked(),
                rated: progress.ratings.is_some(),
            })
            .collect();

        let scale_guess = trial
            .phases
            .first()
            .and_then(|p| extract_key(&p.file.filename, &KeyPolicy::default()));

        TrialView {
            block: trial.block.clone(),
            item_key: trial.key.clone(),
            scale_guess,
            cursor,
            phases,
        }
    });

    SessionView {
        session_id: id,
        participant_id: session.participant_id().to_string(),
        started_at: session.started_at(),
        order_seed: session.order_seed(),
        state: session.state(),
        progress: Progress {
            done: session.position(),
            total: session.total(),
            remaining: session.remaining(),
        },
        scale: state.config.scale.into(),
        current,
    }
}

/// URL path under `/stimuli` for a file relative to the stimulus root
fn audio_url(relative: &str) -> String {
    reqwest::Url::parse(AUDIO_BASE)
        .ok()
        .and_then(|mut url| {
            url.path_segments_mut()
                .ok()?
                .pop_if_empty()
                .extend(relative.split('/'));
            Some(url.path().to_string())
        })
        .unwrap_or_else(|| format!("/stimuli/{}", relative))
}

/// Check a block selection against the configured design
///
/// `None` selects every block. Unknown or empty selections are rejected.
fn selected_blocks(requested: Option<Vec<String>>, available: &[String]) -> ApiResult<Option<Vec<String>>> {
    let Some(requested) = requested else {
        return Ok(None);
    };
    if requested.is_empty() {
        return Err(ApiError::BadRequest("Block selection is empty".to_string()));
    }
    if let Some(unknown) = requested.iter().find(|b| !available.contains(b)) {
        return Err(ApiError::BadRequest(format!(
            "Unknown block '{}'; available: {}",
            unknown,
            available.join(", ")
        )));
    }
    Ok(Some(requested))
}

/// POST /api/sessions
///
/// Rescans the stimulus directories, so files added since startup are
/// included. An optional block selection restricts the session to those
/// blocks, still presented in their configured order. Returns 201 with the
/// new session's view.
pub async fn start(
    State(state): State<AppState>,
    payload: Result<Json<StartSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionView>)> {
    let Json(request) = payload?;
    let blocks = selected_blocks(request.blocks, &state.config.design.block_names())?;

    state.sweep_idle_sessions(state.clock.now()).await;

    let catalog = Catalog::load(
        &state.config.design,
        &state.config.stimulus_root,
        &state.scanner,
    )?;

    let mut trials = catalog.grouping.trials;
    if let Some(blocks) = &blocks {
        trials.retain(|t| blocks.contains(&t.block));
    }

    let participant_id = request
        .participant_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(lxp_common::uuid_utils::participant_token);

    let session = start_session_at(participant_id, trials, request.seed, state.clock.now());

    let id = state.insert_session(session.clone()).await;
    let view = session_view(id, &session, &state);

    tracing::info!(
        session_id = %id,
        participant_id = %view.participant_id,
        blocks = ?blocks,
        "Session created"
    );

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let shared = state.session(id).await?;
    let live = shared.lock().await;
    Ok(Json(session_view(id, &live.session, &state)))
}

/// POST /api/sessions/:id/play
pub async fn play(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<PlayRequest>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(request) = payload?;
    let shared = state.session(id).await?;
    let mut live = shared.lock().await;

    live.session = live.session.record_play(request.phase)?;
    live.touched_at = state.clock.now();
    tracing::debug!(session_id = %id, phase = request.phase, "Play recorded");

    Ok(Json(session_view(id, &live.session, &state)))
}

/// POST /api/sessions/:id/ratings
///
/// Rates the phase awaiting a rating. Out-of-scale values, including ones
/// that do not fit a rating at all, are rejected with 400 before the session
/// is touched.
pub async fn rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<RatingsRequest>, JsonRejection>,
) -> ApiResult<Json<SessionView>> {
    let Json(request) = payload?;
    let ratings = state
        .config
        .scale
        .ratings(request.valence, request.arousal, request.difficulty)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let shared = state.session(id).await?;
    let mut live = shared.lock().await;

    live.session = live.session.submit_rating(ratings)?;
    live.touched_at = state.clock.now();
    tracing::debug!(session_id = %id, cursor = ?live.session.cursor(), "Rating accepted");

    Ok(Json(session_view(id, &live.session, &state)))
}

/// POST /api/sessions/:id/submit
///
/// Builds the record for the current trial and delivers it. The session
/// advances only after the local write succeeds; a remote failure is
/// returned as `remote_warning` and kept as the service's last error.
/// A session that reaches `done` is removed, so later requests for it
/// answer 404.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Json(request) = payload?;
    let shared = state.session(id).await?;
    let mut live = shared.lock().await;

    let record = build_record(
        &live.session,
        request.notes.as_deref(),
        &state.config.scale,
        state.clock.as_ref(),
    )?;

    let delivery = state
        .sink
        .deliver_result(&state.record_layout, &record)
        .await?;

    let remote_warning = delivery.remote_error().map(str::to_string);
    if let Some(warning) = &remote_warning {
        *state.last_error.write().await = Some(warning.clone());
    }

    live.session = live.session.advance();
    live.touched_at = state.clock.now();

    tracing::info!(
        session_id = %id,
        participant_id = %record.participant_id,
        item_key = %record.item_key,
        trial_index = record.trial_index,
        remaining = live.session.remaining(),
        "Trial recorded"
    );

    let view = session_view(id, &live.session, &state);
    let done = live.session.is_done();
    drop(live);
    if done {
        state.remove_session(id).await;
        tracing::info!(session_id = %id, "Session complete");
    }

    Ok(Json(SubmitResponse {
        session: view,
        recorded: record.item_key,
        remote_warning,
    }))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(start))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/play", post(play))
        .route("/api/sessions/:id/ratings", post(rate))
        .route("/api/sessions/:id/submit", post(submit))
}
