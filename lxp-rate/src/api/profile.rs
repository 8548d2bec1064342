//! Participant profile questionnaire

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    error::ApiResult,
    models::ProfileQuestion,
    services::build_profile,
    AppState,
};

/// POST /api/profile request
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub participant_id: String,
    /// Question id → chosen answer
    pub answers: BTreeMap<String, String>,
    #[serde(default)]
    pub free_text: Option<String>,
}

/// POST /api/profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub participant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_warning: Option<String>,
}

/// GET /api/profile/questions
pub async fn questions(State(state): State<AppState>) -> Json<Vec<ProfileQuestion>> {
    Json(state.config.profile.questions.clone())
}

/// POST /api/profile
pub async fn submit_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProfileResponse>)> {
    let Json(request) = payload?;
    let record = build_profile(
        &state.config.profile.questions,
        &request.participant_id,
        &request.answers,
        request.free_text.as_deref(),
        state.clock.as_ref(),
    )?;

    let delivery = state
        .sink
        .deliver_profile(&state.profile_layout, &record)
        .await?;

    let remote_warning = delivery.remote_error().map(str::to_string);
    if let Some(warning) = &remote_warning {
        *state.last_error.write().await = Some(warning.clone());
    }

    tracing::info!(participant_id = %record.participant_id, "Profile recorded");

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse {
            participant_id: record.participant_id,
            remote_warning,
        }),
    ))
}

/// Build profile routes
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile", post(submit_profile))
        .route("/api/profile/questions", get(questions))
}
