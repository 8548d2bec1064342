//! Item key extraction from stimulus filenames
//!
//! Two naming conventions are supported, selected by configuration:
//! - **Prefix**: the stem up to the first separator (`D_control_x.wav` → `D`)
//! - **Marker**: the stem before a marker token (`A_balanced_SEQ_scale.wav`
//!   with marker `_SEQ` → `A_balanced`)
//!
//! Extraction works on the file stem (extension removed) and is a pure
//! function of the filename and policy.

use crate::models::ItemKey;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Filename convention used to recover the item key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Stem prefix before the first separator; a stem without one is its own key
    Prefix {
        #[serde(default = "default_separator")]
        separator: char,
    },
    /// Stem prefix before the earliest marker token on a token boundary
    ///
    /// Matching is case-sensitive. `_SEQ` matches in `A_SEQ_x` and `A_SEQ`,
    /// not in `A_SEQUENCE`.
    Marker { markers: Vec<String> },
}

fn default_separator() -> char {
    '_'
}

impl Default for KeyPolicy {
    fn default() -> Self {
        KeyPolicy::Prefix {
            separator: default_separator(),
        }
    }
}

/// Extract the item key from `filename`, or `None` if the convention does not match
pub fn extract_key(filename: &str, policy: &KeyPolicy) -> Option<ItemKey> {
    let stem = Path::new(filename).file_stem()?.to_str()?;

    let key = match policy {
        KeyPolicy::Prefix { separator } => stem
            .split_once(*separator)
            .map(|(prefix, _)| prefix)
            .unwrap_or(stem),
        KeyPolicy::Marker { markers } => {
            let idx = markers
                .iter()
                .filter(|m| !m.is_empty())
                .filter_map(|m| find_marker(stem, m))
                .min()?;
            &stem[..idx]
        }
    };

    if key.is_empty() {
        None
    } else {
        Some(ItemKey::new(key))
    }
}

/// Byte index of the first boundary-respecting occurrence of `marker` in `stem`
fn find_marker(stem: &str, marker: &str) -> Option<usize> {
    stem.match_indices(marker)
        .map(|(idx, _)| idx)
        .find(|&idx| is_token_boundary(stem, idx, marker))
}

fn is_token_boundary(stem: &str, idx: usize, marker: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric();

    let after_ok = stem[idx + marker.len()..]
        .chars()
        .next()
        .map_or(true, |c| !is_word(c));

    // A marker like "_SEQ" carries its own leading boundary
    let before_ok = marker.starts_with(|c: char| !is_word(c))
        || stem[..idx].chars().next_back().map_or(true, |c| !is_word(c));

    after_ok && before_ok
}
