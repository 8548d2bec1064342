//! Stimulus catalog: scan → extract → group for a configured design
//!
//! Loaded fresh for every session so that stimulus changes on disk are
//! picked up without a restart.

use super::pairing::{group, ConditionFiles, Grouping};
use super::stimulus_scanner::StimulusScanner;
use crate::config::DesignConfig;
use lxp_common::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files found for one configured source
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub label: String,
    pub directory: PathBuf,
    pub file_count: usize,
}

/// Grouped trial set plus per-source scan counts
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub sources: Vec<SourceSummary>,
    pub grouping: Grouping,
}

impl Catalog {
    /// Scan every source directory of `design` and group the files
    ///
    /// **Errors:** a source directory that is missing or holds no audio, or a
    /// design that yields no trials, is a configuration error.
    pub fn load(design: &DesignConfig, stimulus_root: &Path, scanner: &StimulusScanner) -> Result<Self> {
        let mut sources = Vec::with_capacity(design.sources.len());
        let mut conditions = Vec::with_capacity(design.sources.len());

        for source in &design.sources {
            let directory = stimulus_root.join(&source.dir);
            let files = scanner.list_stimuli(&directory, &source.label);
            if files.is_empty() {
                return Err(Error::Config(format!(
                    "Stimulus directory for '{}' is missing or empty: {}",
                    source.label,
                    directory.display()
                )));
            }
            sources.push(SourceSummary {
                label: source.label.clone(),
                directory,
                file_count: files.len(),
            });
            conditions.push(ConditionFiles {
                label: source.label.clone(),
                files,
            });
        }

        let grouping = group(&conditions, &design.key_policy, &design.grouping_mode());

        if grouping.skipped_count() > 0 {
            warn!(
                skipped = grouping.skipped_count(),
                "{} items skipped due to incomplete pairing",
                grouping.skipped_count()
            );
        }
        if grouping.unmatched_count() > 0 {
            warn!(
                unmatched = grouping.unmatched_count(),
                "Filenames not matching the key policy were excluded"
            );
        }
        for dup in &grouping.duplicates {
            warn!(
                label = %dup.label,
                key = %dup.key,
                kept = %dup.kept,
                discarded = %dup.discarded,
                "Duplicate item key within one condition"
            );
        }

        if grouping.trials.is_empty() {
            return Err(Error::Config(format!(
                "No pairable trials found under {} ({} skipped, {} unmatched)",
                stimulus_root.display(),
                grouping.skipped_count(),
                grouping.unmatched_count()
            )));
        }

        info!(trials = grouping.trials.len(), "Stimulus catalog loaded");

        Ok(Self { sources, grouping })
    }

    pub fn trial_count(&self) -> usize {
        self.grouping.trials.len()
    }
}
