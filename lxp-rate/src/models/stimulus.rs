//! Listed stimulus files and the item keys that join them across conditions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One audio file found by a directory scan
///
/// Immutable once listed. `label` is the condition or block whose directory
/// the file was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StimulusFile {
    /// Full path as discovered on disk
    pub path: PathBuf,
    /// File name including extension
    pub filename: String,
    /// Condition/block label of the listing
    pub label: String,
}

impl StimulusFile {
    pub fn new(path: PathBuf, label: impl Into<String>) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            filename,
            label: label.into(),
        }
    }

    /// Path relative to `root`, with forward slashes
    ///
    /// Falls back to the bare filename when the file is not under `root`.
    pub fn relative_to(&self, root: &Path) -> String {
        self.path
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| self.filename.clone())
    }
}

/// Identifier shared by files belonging to the same underlying item
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
