//! Presentable trials

use super::stimulus::{ItemKey, StimulusFile};
use serde::Serialize;

/// One condition-specific sub-presentation of a trial
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    /// Condition label (e.g. "SEQ"), or the block name for single-file trials
    pub label: String,
    pub file: StimulusFile,
}

/// One presentable unit of the experiment
///
/// Single-file trials carry one phase. Paired and n-tuple trials carry one
/// phase per condition, in the design's declared condition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trial {
    pub block: String,
    pub key: ItemKey,
    pub phases: Vec<Phase>,
}

impl Trial {
    /// Single-file trial; the phase is labelled with the block
    pub fn single(block: impl Into<String>, key: ItemKey, file: StimulusFile) -> Self {
        let block = block.into();
        Self {
            phases: vec![Phase {
                label: block.clone(),
                file,
            }],
            block,
            key,
        }
    }

    /// A trial is usable only when it has at least one phase
    pub fn is_consistent(&self) -> bool {
        !self.phases.is_empty()
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Stable identifier, `block/key`
    pub fn id(&self) -> String {
        format!("{}/{}", self.block, self.key)
    }
}
