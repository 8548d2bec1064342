//! PIN-gated results view for experimenters

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use crate::{
    error::{ApiError, ApiResult},
    sinks::csv_sink::TableTail,
    AppState,
};

/// Header carrying the admin PIN
pub const PIN_HEADER: &str = "x-admin-pin";

/// Rows returned by the JSON view
pub const TAIL_ROWS: usize = 20;

fn check_pin(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    let supplied = headers.get(PIN_HEADER).and_then(|v| v.to_str().ok());
    match supplied {
        Some(pin) if pin == state.config.admin_pin => Ok(()),
        Some(_) => {
            tracing::warn!("Admin PIN rejected");
            Err(ApiError::Unauthorized("Invalid admin PIN".to_string()))
        }
        None => Err(ApiError::Unauthorized(format!("Missing {} header", PIN_HEADER))),
    }
}

/// GET /api/admin/results
///
/// Header and the most recent rows of the local results table.
pub async fn recent_results(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<TableTail>> {
    check_pin(&state, &headers)?;
    Ok(Json(state.csv.tail_results(TAIL_ROWS)?))
}

/// GET /api/admin/results.csv
pub async fn download_results(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    check_pin(&state, &headers)?;

    let path = state.csv.results_path();
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound("No results recorded yet".to_string()));
        }
        Err(e) => return Err(lxp_common::Error::Io(e).into()),
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results.csv".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

/// Build admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/results", get(recent_results))
        .route("/api/admin/results.csv", get(download_results))
}
