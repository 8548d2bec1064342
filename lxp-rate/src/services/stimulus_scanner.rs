//! Stimulus directory scanner
//!
//! Lists the audio files directly inside one condition/block directory.
//! A missing directory is not an error: it yields no stimuli, and the catalog
//! reports the empty condition as a configuration problem.

use crate::models::StimulusFile;
use std::path::Path;
use walkdir::WalkDir;

/// Extensions recognized when no list is configured
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["wav", "mp3", "m4a", "ogg"];

/// Audio file scanner for stimulus directories
#[derive(Debug, Clone)]
pub struct StimulusScanner {
    extensions: Vec<String>,
}

impl StimulusScanner {
    /// Create scanner recognizing `.wav`, `.mp3`, `.m4a` and `.ogg`
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_EXTENSIONS)
    }

    /// Create scanner with a custom extension set (case-insensitive, no dot)
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// List stimuli in `directory`, sorted by filename
    ///
    /// Only regular files at depth 1 are considered; subdirectories are not
    /// descended into.
    pub fn list_stimuli(&self, directory: &Path, label: &str) -> Vec<StimulusFile> {
        if !directory.is_dir() {
            tracing::debug!(
                directory = %directory.display(),
                label,
                "Stimulus directory absent, listing nothing"
            );
            return Vec::new();
        }

        let mut files: Vec<StimulusFile> = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.is_audio_file(entry.path()))
            .map(|entry| StimulusFile::new(entry.into_path(), label))
            .collect();

        files.sort_by(|a, b| a.filename.cmp(&b.filename));

        tracing::debug!(
            directory = %directory.display(),
            label,
            count = files.len(),
            "Listed stimuli"
        );

        files
    }

    /// Check if file has a recognized audio extension
    fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.is_audio_extension(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    fn is_audio_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

impl Default for StimulusScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// List stimuli with the default extension set
pub fn list_stimuli(directory: &Path, label: &str) -> Vec<StimulusFile> {
    StimulusScanner::new().list_stimuli(directory, label)
}
