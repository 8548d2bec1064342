//! Configuration for lxp-rate
//!
//! Loaded from TOML (see `lxp_common::config` for file resolution). Every
//! field has a built-in default, so an absent file runs the two-condition
//! sequential/simultaneous design from `assets/` and writes to `data/`.
//!
//! ```toml
//! port = 5780
//! stimulus_root = "assets"
//! data_dir = "data"
//! session_idle_timeout_secs = 14400
//!
//! [design]
//! kind = "paired"
//! block = "main"
//! key_policy = { mode = "marker", markers = ["_SEQ", "_SIM"] }
//! sources = [
//!     { label = "SEQ", dir = "sequential" },
//!     { label = "SIM", dir = "simultaneous" },
//! ]
//!
//! [scale]
//! min = 1
//! max = 7
//!
//! [sinks]
//! remote_url = "https://example.org/append"
//! ```

use crate::models::profile::default_questions;
use crate::models::{ProfileQuestion, RatingScale};
use crate::services::key_extractor::KeyPolicy;
use crate::services::pairing::GroupingMode;
use crate::services::stimulus_scanner::DEFAULT_EXTENSIONS;
use crate::sinks::layout::PROFILE_RESERVED_COLUMNS;
use lxp_common::config::{load_toml_config, LoggingConfig};
use lxp_common::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5780;

/// Default idle time before an unfinished session is dropped (4 hours)
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 4 * 60 * 60;

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    pub port: u16,
    /// Directory containing one subdirectory per condition/block
    pub stimulus_root: PathBuf,
    /// Directory receiving the result and profile tables
    pub data_dir: PathBuf,
    /// PIN for the admin results view
    pub admin_pin: String,
    /// Recognized audio extensions
    pub extensions: Vec<String>,
    /// Unfinished sessions untouched for this long are dropped; 0 keeps them
    pub session_idle_timeout_secs: u64,
    pub logging: LoggingConfig,
    pub design: DesignConfig,
    pub scale: RatingScale,
    pub sinks: SinkConfig,
    pub profile: ProfileConfig,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            stimulus_root: PathBuf::from("assets"),
            data_dir: PathBuf::from("data"),
            admin_pin: "0000".to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            logging: LoggingConfig::default(),
            design: DesignConfig::default(),
            scale: RatingScale::default(),
            sinks: SinkConfig::default(),
            profile: ProfileConfig::default(),
        }
    }
}

impl RateConfig {
    /// Load from `path` (defaults if absent) and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = load_toml_config(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale.min >= self.scale.max {
            return Err(Error::Config(format!(
                "Rating scale min ({}) must be below max ({})",
                self.scale.min, self.scale.max
            )));
        }
        if self.extensions.is_empty() {
            return Err(Error::Config("No audio extensions configured".to_string()));
        }
        self.design.validate()?;

        let mut ids = HashSet::new();
        for question in &self.profile.questions {
            let id = question.id.trim();
            if id.is_empty() {
                return Err(Error::Config("Profile question with empty id".to_string()));
            }
            if PROFILE_RESERVED_COLUMNS.contains(&id) {
                return Err(Error::Config(format!(
                    "Profile question id '{}' collides with a reserved column",
                    id
                )));
            }
            if !ids.insert(id) {
                return Err(Error::Config(format!("Duplicate profile question id '{}'", id)));
            }
            if question.choices.is_empty() {
                return Err(Error::Config(format!(
                    "Profile question '{}' has no choices",
                    question.id
                )));
            }
        }
        Ok(())
    }

    pub fn results_path(&self) -> PathBuf {
        self.data_dir.join(&self.sinks.results_file)
    }

    pub fn profiles_path(&self) -> PathBuf {
        self.data_dir.join(&self.sinks.profiles_file)
    }
}

/// How sources combine into trials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignKind {
    /// One trial per item key common to all sources, one phase per source
    Paired,
    /// Each source is a block of single-file trials
    Blocks,
}

/// One stimulus directory and its condition/block label
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDir {
    pub label: String,
    /// Relative to `stimulus_root`
    pub dir: PathBuf,
}

/// Experiment design
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    pub kind: DesignKind,
    /// Block name given to paired trials
    pub block: String,
    pub key_policy: KeyPolicy,
    /// Declared in presentation (blocks) or phase (paired) order
    pub sources: Vec<SourceDir>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            kind: DesignKind::Paired,
            block: "main".to_string(),
            key_policy: KeyPolicy::Marker {
                markers: vec!["_SEQ".to_string(), "_SIM".to_string()],
            },
            sources: vec![
                SourceDir {
                    label: "SEQ".to_string(),
                    dir: PathBuf::from("sequential"),
                },
                SourceDir {
                    label: "SIM".to_string(),
                    dir: PathBuf::from("simultaneous"),
                },
            ],
        }
    }
}

impl DesignConfig {
    pub fn grouping_mode(&self) -> GroupingMode {
        match self.kind {
            DesignKind::Paired => GroupingMode::Intersection {
                block: self.block.clone(),
            },
            DesignKind::Blocks => GroupingMode::Independent,
        }
    }

    /// Blocks a session can be restricted to
    ///
    /// The source labels for a blocks design; the single paired block otherwise.
    pub fn block_names(&self) -> Vec<String> {
        match self.kind {
            DesignKind::Paired => vec![self.block.clone()],
            DesignKind::Blocks => self.sources.iter().map(|s| s.label.clone()).collect(),
        }
    }

    /// Phase slot names used for per-phase result columns
    pub fn phase_slots(&self) -> Vec<String> {
        match self.kind {
            DesignKind::Paired => self.sources.iter().map(|s| s.label.clone()).collect(),
            DesignKind::Blocks => vec!["stimulus".to_string()],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(Error::Config(
                "Design declares no stimulus directories".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.label.trim().is_empty() {
                return Err(Error::Config("Stimulus source with empty label".to_string()));
            }
            if !seen.insert(source.label.as_str()) {
                return Err(Error::Config(format!(
                    "Duplicate stimulus source label '{}'",
                    source.label
                )));
            }
        }
        if let KeyPolicy::Marker { markers } = &self.key_policy {
            if markers.iter().all(|m| m.is_empty()) {
                return Err(Error::Config("Marker key policy needs at least one marker".to_string()));
            }
        }
        Ok(())
    }
}

/// Result sinks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// File name under `data_dir`
    pub results_file: String,
    pub profiles_file: String,
    /// Remote append endpoint; written in addition to the local files
    pub remote_url: Option<String>,
    pub remote_timeout_secs: u64,
    /// Restrict result columns to this subset (in this order)
    pub columns: Option<Vec<String>>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            results_file: "evaluation_results.csv".to_string(),
            profiles_file: "participants.csv".to_string(),
            remote_url: None,
            remote_timeout_secs: 10,
            columns: None,
        }
    }
}

/// Participant questionnaire
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    pub questions: Vec<ProfileQuestion>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            questions: default_questions(),
        }
    }
}
