//! HTTP API integration tests
//!
//! Drives the router with `oneshot` requests against temp stimulus and data
//! directories.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use lxp_rate::config::{DesignConfig, DesignKind, RateConfig, SourceDir};
use lxp_rate::services::{FixedClock, KeyPolicy};
use lxp_rate::sinks::RemoteSink;
use lxp_rate::{build_router, AppState};

struct TestApp {
    router: Router,
    data: TempDir,
    _stimuli: TempDir,
}

fn write_files(root: &Path, dir: &str, names: &[&str]) {
    let path = root.join(dir);
    fs::create_dir_all(&path).unwrap();
    for name in names {
        fs::write(path.join(name), b"RIFF").unwrap();
    }
}

/// Default paired design over one SEQ/SIM pair plus an unpaired SEQ file
fn test_app() -> TestApp {
    let stimuli = tempfile::tempdir().unwrap();
    write_files(
        stimuli.path(),
        "sequential",
        &["A_balanced_SEQ_scale.wav", "B_tense_SEQ_scale.wav"],
    );
    write_files(stimuli.path(), "simultaneous", &["A_balanced_SIM_prog.wav"]);
    app_with(stimuli)
}

fn app_with(stimuli: TempDir) -> TestApp {
    app_with_design(stimuli, DesignConfig::default()).0
}

/// App over `stimuli` with the given design, plus a handle on its state
fn app_with_design(stimuli: TempDir, design: DesignConfig) -> (TestApp, AppState) {
    let data = tempfile::tempdir().unwrap();
    let config = RateConfig {
        stimulus_root: stimuli.path().to_path_buf(),
        data_dir: data.path().to_path_buf(),
        design,
        ..RateConfig::default()
    };
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
    let state = AppState::with_sinks(config, None, Arc::new(clock)).unwrap();

    let app = TestApp {
        router: build_router(state.clone()),
        data,
        _stimuli: stimuli,
    };
    (app, state)
}

/// Independent blocks over the two condition directories
fn blocks_design() -> DesignConfig {
    DesignConfig {
        kind: DesignKind::Blocks,
        block: "main".to_string(),
        key_policy: KeyPolicy::Prefix { separator: '_' },
        sources: ["sequential", "simultaneous"]
            .into_iter()
            .map(|name| SourceDir {
                label: name.to_string(),
                dir: name.into(),
            })
            .collect(),
    }
}

/// Play and rate every phase of the current trial, then submit it
async fn complete_trial(app: &TestApp, id: &str) -> Value {
    let base = format!("/api/sessions/{}", id);
    for phase in 0..2 {
        let (status, _) = send(app, "POST", &format!("{}/play", base), Some(json!({"phase": phase}))).await;
        assert_eq!(status, StatusCode::OK);
        let ratings = json!({"valence": 4, "arousal": 4, "difficulty": 4});
        let (status, _) = send(app, "POST", &format!("{}/ratings", base), Some(ratings)).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = send(app, "POST", &format!("{}/submit", base), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

async fn send(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn start(app: &TestApp) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/sessions",
        Some(json!({"participant_id": "p1", "seed": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lxp-rate");
}

#[tokio::test]
async fn test_stimuli_summary_reports_skipped_items() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/stimuli", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trial_count"], 1);
    assert_eq!(body["skipped"][0]["key"], "B_tense");
    assert_eq!(body["phase_slots"], json!(["SEQ", "SIM"]));
}

#[tokio::test]
async fn test_start_session_view() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({"participant_id": "  p1 ", "seed": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["participant_id"], "p1");
    assert_eq!(body["order_seed"], 1);
    assert_eq!(body["state"], json!({"state": "ready", "position": 0}));
    assert_eq!(body["progress"], json!({"done": 0, "total": 1, "remaining": 1}));
    assert_eq!(body["scale"], json!({"min": 1, "max": 7, "midpoint": 4}));

    let current = &body["current"];
    assert_eq!(current["item_key"], "A_balanced");
    assert_eq!(current["scale_guess"], "A");
    assert_eq!(current["cursor"], json!({"status": "awaiting", "phase": 0}));
    assert_eq!(
        current["phases"][0]["audio_url"],
        "/stimuli/sequential/A_balanced_SEQ_scale.wav"
    );
    assert_eq!(current["phases"][1]["label"], "SIM");
    assert_eq!(current["phases"][1]["unlocked"], false);
}

#[tokio::test]
async fn test_generated_participant_id() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/api/sessions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["participant_id"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn test_missing_condition_directory_is_422() {
    let stimuli = tempfile::tempdir().unwrap();
    write_files(stimuli.path(), "sequential", &["A_SEQ.wav"]);
    let app = app_with(stimuli);

    let (status, body) = send(&app, "POST", "/api/sessions", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = test_app();
    let uri = format!("/api/sessions/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rating_before_play_is_409() {
    let app = test_app();
    let id = start(&app).await;

    let uri = format!("/api/sessions/{}/ratings", id);
    let ratings = json!({"valence": 4, "arousal": 4, "difficulty": 4});
    let (status, body) = send(&app, "POST", &uri, Some(ratings)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "SESSION_STATE");
}

#[tokio::test]
async fn test_out_of_range_rating_is_400() {
    let app = test_app();
    let id = start(&app).await;
    send(&app, "POST", &format!("/api/sessions/{}/play", id), Some(json!({"phase": 0}))).await;

    let uri = format!("/api/sessions/{}/ratings", id);
    let ratings = json!({"valence": 8, "arousal": 4, "difficulty": 4});
    let (status, _) = send(&app, "POST", &uri, Some(ratings)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_before_all_phases_rated_is_409() {
    let app = test_app();
    let id = start(&app).await;

    let uri = format!("/api/sessions/{}/submit", id);
    let (status, _) = send(&app, "POST", &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(!app.data.path().join("evaluation_results.csv").exists());
}

#[tokio::test]
async fn test_full_trial_records_one_row() {
    let app = test_app();
    let id = start(&app).await;
    let base = format!("/api/sessions/{}", id);

    for (phase, ratings) in [
        (0, json!({"valence": 5, "arousal": 3, "difficulty": 2})),
        (1, json!({"valence": 4, "arousal": 4, "difficulty": 3})),
    ] {
        let (status, _) = send(&app, "POST", &format!("{}/play", base), Some(json!({"phase": phase}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", &format!("{}/ratings", base), Some(ratings)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/submit", base),
        Some(json!({"notes": " smooth "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recorded"], "A_balanced");
    assert_eq!(body["session"]["state"], json!({"state": "done"}));
    assert_eq!(body["session"]["current"], Value::Null);
    assert!(body.get("remote_warning").is_none());

    let content = fs::read_to_string(app.data.path().join("evaluation_results.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("timestamp,participant_id,session_started_at,block,item_key"));
    assert!(lines[1].contains(",A_balanced_SEQ_scale.wav,5,3,2,1,"));
    assert!(lines[1].contains(",A_balanced_SIM_prog.wav,4,4,3,1,"));
    assert!(lines[1].ends_with(",smooth"));

    // A finished session is released
    let (status, _) = send(&app, "POST", &format!("{}/play", base), Some(json!({"phase": 0}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_finished_sessions_leave_active_count() {
    let app = test_app();
    let finished = start(&app).await;
    let _open = start(&app).await;

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["active_sessions"], 2);

    let body = complete_trial(&app, &finished).await;
    assert_eq!(body["session"]["state"], json!({"state": "done"}));

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["active_sessions"], 1);
    let (status, _) = send(&app, "GET", &format!("/api/sessions/{}", finished), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_idle_sessions_are_swept() {
    let stimuli = tempfile::tempdir().unwrap();
    write_files(stimuli.path(), "sequential", &["A_x_SEQ.wav"]);
    write_files(stimuli.path(), "simultaneous", &["A_x_SIM.wav"]);
    let (app, state) = app_with_design(stimuli, DesignConfig::default());
    let id = start(&app).await;

    let started = Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap();
    assert_eq!(state.sweep_idle_sessions(started + chrono::Duration::hours(1)).await, 0);
    assert_eq!(state.sweep_idle_sessions(started + chrono::Duration::hours(5)).await, 1);

    let (status, _) = send(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["active_sessions"], 0);
}

#[tokio::test]
async fn test_rating_outside_byte_range_is_400() {
    let app = test_app();
    let id = start(&app).await;
    send(&app, "POST", &format!("/api/sessions/{}/play", id), Some(json!({"phase": 0}))).await;

    let uri = format!("/api/sessions/{}/ratings", id);
    for ratings in [
        json!({"valence": 300, "arousal": 4, "difficulty": 4}),
        json!({"valence": 4, "arousal": -1, "difficulty": 4}),
        json!({"valence": "high", "arousal": 4, "difficulty": 4}),
    ] {
        let (status, body) = send(&app, "POST", &uri, Some(ratings.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", ratings);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert!(body["error"]["message"].is_string());
    }

    // Nothing was recorded against the phase
    let (_, body) = send(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(body["current"]["phases"][0]["rated"], false);
}

#[tokio::test]
async fn test_session_restricted_to_one_block() {
    let stimuli = tempfile::tempdir().unwrap();
    write_files(stimuli.path(), "sequential", &["A_x.wav", "B_x.wav"]);
    write_files(stimuli.path(), "simultaneous", &["C_x.wav"]);
    let (app, _) = app_with_design(stimuli, blocks_design());

    let (status, body) = send(&app, "POST", "/api/sessions", Some(json!({"seed": 3}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["progress"]["total"], 3);
    assert_eq!(body["current"]["block"], "sequential");

    let request = json!({"seed": 3, "blocks": ["simultaneous"]});
    let (status, body) = send(&app, "POST", "/api/sessions", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["progress"]["total"], 1);
    assert_eq!(body["current"]["block"], "simultaneous");
    assert_eq!(body["current"]["item_key"], "C");

    let request = json!({"blocks": ["chords"]});
    let (status, body) = send(&app, "POST", "/api/sessions", Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["active_sessions"], 2);
}

#[tokio::test]
async fn test_stimulus_audio_is_served() {
    let app = test_app();
    let request = Request::builder()
        .uri("/stimuli/sequential/A_balanced_SEQ_scale.wav")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_requires_pin() {
    let app = test_app();
    let (status, _) = send(&app, "GET", "/api/admin/results", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/admin/results")
        .header("x-admin-pin", "0000")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["rows"], json!([]));
}

#[tokio::test]
async fn test_admin_download_before_any_result_is_404() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/admin/results.csv")
        .header("x-admin-pin", "0000")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_submission() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/profile/questions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let request = json!({
        "participant_id": "p1",
        "answers": {
            "musical_training": "1-3",
            "microtonal_familiarity": "none",
            "listening_device": "headphones"
        },
        "free_text": "first time"
    });
    let (status, body) = send(&app, "POST", "/api/profile", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["participant_id"], "p1");

    let content = fs::read_to_string(app.data.path().join("participants.csv")).unwrap();
    assert_eq!(
        content,
        "participant_id,timestamp,musical_training,microtonal_familiarity,listening_device,free_text\n\
         p1,2026-10-16T12:00:00Z,1-3,none,headphones,first time\n"
    );
}

#[tokio::test]
async fn test_profile_invalid_choice_is_400() {
    let app = test_app();
    let request = json!({
        "participant_id": "p1",
        "answers": {
            "musical_training": "lots",
            "microtonal_familiarity": "none",
            "listening_device": "headphones"
        }
    });
    let (status, body) = send(&app, "POST", "/api/profile", Some(request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_PROFILE");
}

#[tokio::test]
async fn test_profile_without_answers_is_400() {
    let app = test_app();
    let (status, body) = send(&app, "POST", "/api/profile", Some(json!({"participant_id": "p1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_remote_failure_is_reported_not_fatal() {
    let stimuli = tempfile::tempdir().unwrap();
    write_files(stimuli.path(), "sequential", &["A_x_SEQ.wav"]);
    write_files(stimuli.path(), "simultaneous", &["A_x_SIM.wav"]);
    let data = tempfile::tempdir().unwrap();
    let config = RateConfig {
        stimulus_root: stimuli.path().to_path_buf(),
        data_dir: data.path().to_path_buf(),
        ..RateConfig::default()
    };
    let remote = RemoteSink::new("http://127.0.0.1:9/append", Duration::from_millis(500)).unwrap();
    let clock = FixedClock(Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap());
    let state = AppState::with_sinks(config, Some(Arc::new(remote)), Arc::new(clock)).unwrap();
    let app = TestApp {
        router: build_router(state),
        data,
        _stimuli: stimuli,
    };

    let id = start(&app).await;
    let base = format!("/api/sessions/{}", id);
    for phase in 0..2 {
        send(&app, "POST", &format!("{}/play", base), Some(json!({"phase": phase}))).await;
        let ratings = json!({"valence": 4, "arousal": 4, "difficulty": 4});
        send(&app, "POST", &format!("{}/ratings", base), Some(ratings)).await;
    }

    let (status, body) = send(&app, "POST", &format!("{}/submit", base), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["remote_warning"].is_string());
    assert!(app.data.path().join("evaluation_results.csv").exists());

    let (_, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(health["status"], "degraded");
    assert!(health["last_error"].is_string());
}
