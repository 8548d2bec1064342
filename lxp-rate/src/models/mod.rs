//! Data model for stimuli, trials, sessions and result records

pub mod profile;
pub mod rating;
pub mod record;
pub mod session;
pub mod stimulus;
pub mod trial;

pub use profile::{ProfileAnswer, ProfileQuestion, ProfileRecord};
pub use rating::{RatingScale, Ratings, ScaleError};
pub use record::{PhaseResult, ResultRecord};
pub use session::{PhaseCursor, PhaseProgress, SequencerState, Session, SessionError};
pub use stimulus::{ItemKey, StimulusFile};
pub use trial::{Phase, Trial};
