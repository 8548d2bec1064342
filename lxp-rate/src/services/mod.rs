//! Stimulus pairing and sequencing engine

pub mod catalog;
pub mod key_extractor;
pub mod pairing;
pub mod record_builder;
pub mod sequencer;
pub mod stimulus_scanner;

pub use catalog::{Catalog, SourceSummary};
pub use key_extractor::{extract_key, KeyPolicy};
pub use pairing::{group, ConditionFiles, Grouping, GroupingMode};
pub use record_builder::{
    build_profile, build_record, FixedClock, ProfileError, RecordError, SystemClock,
    TimestampSource,
};
pub use sequencer::{presentation_order, start_session, start_session_at};
pub use stimulus_scanner::{list_stimuli, StimulusScanner};
