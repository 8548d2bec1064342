//! Pairing/grouping of per-condition listings into trials
//!
//! **Algorithm (intersection mode):**
//! 1. Per condition, map extracted key → file (last write wins; duplicates reported)
//! 2. Walk the union of keys in sorted order
//! 3. Keys present in every condition become trials, one phase per condition
//! 4. Keys missing from any condition are reported as skipped
//!
//! **Independent mode** turns every file with an extractable key into its own
//! single-phase trial, with the condition label as its block.
//!
//! Nothing is dropped silently: skipped keys, unmatched filenames and
//! duplicate keys are all returned alongside the trials.

use super::key_extractor::{extract_key, KeyPolicy};
use crate::models::{ItemKey, Phase, StimulusFile, Trial};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How condition listings combine into trials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupingMode {
    /// Paired/n-tuple trials over keys common to all conditions
    Intersection { block: String },
    /// One single-file trial per file; each condition is its own block
    Independent,
}

/// Files listed for one condition or block, in declared order
#[derive(Debug, Clone)]
pub struct ConditionFiles {
    pub label: String,
    pub files: Vec<StimulusFile>,
}

/// Key found in only some conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub key: ItemKey,
    pub present_in: Vec<String>,
}

/// Filename the key policy could not parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmatchedFile {
    pub label: String,
    pub filename: String,
}

/// Two files in one condition sharing a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateKey {
    pub label: String,
    pub key: ItemKey,
    pub kept: String,
    pub discarded: String,
}

/// Outcome of grouping
#[derive(Debug, Clone, Default, Serialize)]
pub struct Grouping {
    /// Sorted by block (declared order) then key
    pub trials: Vec<Trial>,
    pub skipped: Vec<SkippedItem>,
    pub unmatched: Vec<UnmatchedFile>,
    pub duplicates: Vec<DuplicateKey>,
}

impl Grouping {
    /// Number of items skipped due to incomplete pairing
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }
}

/// Group condition listings into trials
pub fn group(conditions: &[ConditionFiles], policy: &KeyPolicy, mode: &GroupingMode) -> Grouping {
    match mode {
        GroupingMode::Intersection { block } => group_intersection(conditions, policy, block),
        GroupingMode::Independent => group_independent(conditions, policy),
    }
}

fn group_intersection(conditions: &[ConditionFiles], policy: &KeyPolicy, block: &str) -> Grouping {
    let mut grouping = Grouping::default();

    let keyed: Vec<BTreeMap<ItemKey, &StimulusFile>> = conditions
        .iter()
        .map(|condition| {
            let mut by_key: BTreeMap<ItemKey, &StimulusFile> = BTreeMap::new();
            for file in &condition.files {
                let Some(key) = extract_key(&file.filename, policy) else {
                    grouping.unmatched.push(UnmatchedFile {
                        label: condition.label.clone(),
                        filename: file.filename.clone(),
                    });
                    continue;
                };
                if let Some(previous) = by_key.insert(key.clone(), file) {
                    grouping.duplicates.push(DuplicateKey {
                        label: condition.label.clone(),
                        key,
                        kept: file.filename.clone(),
                        discarded: previous.filename.clone(),
                    });
                }
            }
            by_key
        })
        .collect();

    let all_keys: BTreeSet<&ItemKey> = keyed.iter().flat_map(|m| m.keys()).collect();

    for key in all_keys {
        let present_in: Vec<String> = conditions
            .iter()
            .zip(&keyed)
            .filter(|(_, by_key)| by_key.contains_key(key))
            .map(|(condition, _)| condition.label.clone())
            .collect();

        if present_in.len() < conditions.len() {
            grouping.skipped.push(SkippedItem {
                key: key.clone(),
                present_in,
            });
            continue;
        }

        let phases = conditions
            .iter()
            .zip(&keyed)
            .filter_map(|(condition, by_key)| {
                by_key.get(key).map(|file| Phase {
                    label: condition.label.clone(),
                    file: (*file).clone(),
                })
            })
            .collect();

        grouping.trials.push(Trial {
            block: block.to_string(),
            key: key.clone(),
            phases,
        });
    }

    grouping
}

fn group_independent(conditions: &[ConditionFiles], policy: &KeyPolicy) -> Grouping {
    let mut grouping = Grouping::default();

    for condition in conditions {
        let mut block_trials: Vec<Trial> = Vec::with_capacity(condition.files.len());
        for file in &condition.files {
            match extract_key(&file.filename, policy) {
                Some(key) => block_trials.push(Trial::single(&condition.label, key, file.clone())),
                None => grouping.unmatched.push(UnmatchedFile {
                    label: condition.label.clone(),
                    filename: file.filename.clone(),
                }),
            }
        }
        block_trials.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then_with(|| a.phases[0].file.filename.cmp(&b.phases[0].file.filename))
        });
        grouping.trials.extend(block_trials);
    }

    grouping
}
