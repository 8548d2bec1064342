//! lxp-rate library interface for testing
//!
//! Exposes the pairing/sequencing engine, sinks and HTTP API for integration
//! testing. The binary in `main.rs` only parses arguments and serves
//! [`build_router`].

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod sinks;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::RateConfig;
use crate::models::Session;
use crate::services::{StimulusScanner, SystemClock, TimestampSource};
use crate::sinks::{CsvSink, DualSink, ProfileLayout, RecordLayout, RemoteSink, ResultSink};

/// Session plus the time of its last transition
#[derive(Debug)]
pub struct LiveSession {
    pub session: Session,
    pub touched_at: DateTime<Utc>,
}

/// Live participant session
///
/// The mutex is held across record delivery on submit, so a session only
/// advances after its row has been written.
pub type SharedSession = Arc<Mutex<LiveSession>>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RateConfig>,
    pub scanner: StimulusScanner,
    pub record_layout: Arc<RecordLayout>,
    pub profile_layout: Arc<ProfileLayout>,
    /// Local CSV plus optional remote sink
    pub sink: DualSink,
    /// Local sink, also read back by the admin view
    pub csv: Arc<CsvSink>,
    /// Unfinished sessions; removed on completion or after the idle timeout
    pub sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    pub clock: Arc<dyn TimestampSource>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last remote sink failure, reported by /health
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// Build state from validated configuration
    ///
    /// Builds the remote sink client when `sinks.remote_url` is set.
    pub fn new(config: RateConfig) -> lxp_common::Result<Self> {
        let remote: Option<Arc<dyn ResultSink>> = match &config.sinks.remote_url {
            Some(url) if !url.trim().is_empty() => {
                let sink = RemoteSink::new(
                    url.trim(),
                    Duration::from_secs(config.sinks.remote_timeout_secs),
                )
                .map_err(|e| lxp_common::Error::Config(e.to_string()))?;
                tracing::info!(url = %sink.url(), "Remote result sink enabled");
                Some(Arc::new(sink))
            }
            _ => None,
        };

        Self::with_sinks(config, remote, Arc::new(SystemClock))
    }

    /// Build state with an explicit remote sink and clock
    ///
    /// Creates the data directory if missing.
    pub fn with_sinks(
        config: RateConfig,
        remote: Option<Arc<dyn ResultSink>>,
        clock: Arc<dyn TimestampSource>,
    ) -> lxp_common::Result<Self> {
        lxp_common::config::ensure_directory_exists(&config.data_dir)?;

        let mut record_layout = RecordLayout::new(config.design.phase_slots());
        if let Some(columns) = &config.sinks.columns {
            record_layout = record_layout
                .with_columns(columns)
                .map_err(|e| lxp_common::Error::Config(e.to_string()))?;
        }
        let profile_layout = ProfileLayout::new(&config.profile.questions);

        let csv = Arc::new(CsvSink::new(config.results_path(), config.profiles_path()));
        let sink = DualSink::new(csv.clone(), remote);

        Ok(Self {
            scanner: StimulusScanner::with_extensions(&config.extensions),
            config: Arc::new(config),
            record_layout: Arc::new(record_layout),
            profile_layout: Arc::new(profile_layout),
            sink,
            csv,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        })
    }

    /// Look up a live session
    pub async fn session(&self, id: Uuid) -> ApiResult<SharedSession> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", id)))
    }

    /// Register a new session and return its id
    pub async fn insert_session(&self, session: Session) -> Uuid {
        let id = lxp_common::uuid_utils::generate();
        let live = LiveSession {
            session,
            touched_at: self.clock.now(),
        };
        self.sessions.write().await.insert(id, Arc::new(Mutex::new(live)));
        id
    }

    pub async fn remove_session(&self, id: Uuid) {
        if self.sessions.write().await.remove(&id).is_some() {
            tracing::debug!(session_id = %id, "Session removed");
        }
    }

    /// Drop sessions that are done or untouched since before the idle timeout
    ///
    /// A session locked by an in-flight request is kept. Returns the number
    /// of sessions removed.
    pub async fn sweep_idle_sessions(&self, now: DateTime<Utc>) -> usize {
        let timeout = Duration::from_secs(self.config.session_idle_timeout_secs);
        let cutoff = chrono::Duration::from_std(timeout)
            .ok()
            .and_then(|idle| now.checked_sub_signed(idle));

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, shared| match shared.try_lock() {
            Ok(live) => {
                let expired = timeout > Duration::ZERO
                    && cutoff.map_or(false, |cutoff| live.touched_at < cutoff);
                !live.session.is_done() && !expired
            }
            Err(_) => true,
        });

        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, active = sessions.len(), "Dropped idle sessions");
        }
        removed
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let stimuli = ServeDir::new(&state.config.stimulus_root);

    Router::new()
        .merge(api::session_routes())
        .merge(api::stimuli_routes())
        .merge(api::profile_routes())
        .merge(api::admin_routes())
        .merge(api::health_routes())
        .nest_service("/stimuli", stimuli)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
