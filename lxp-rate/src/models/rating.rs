//! Likert ratings and the ordinal scale they must fall within
//!
//! All three dimensions share one scale, 1..=7 by default. Higher always
//! means "more": more pleasant (valence), more excited (arousal), harder or
//! stranger (difficulty).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rating outside the declared scale
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{dimension} rating {value} outside scale {min}..={max}")]
pub struct ScaleError {
    pub dimension: &'static str,
    pub value: i64,
    pub min: u8,
    pub max: u8,
}

/// One phase's ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    /// Unpleasant → pleasant
    pub valence: u8,
    /// Calm → excited
    pub arousal: u8,
    /// Easy → hard / strange
    pub difficulty: u8,
}

impl Ratings {
    pub fn new(valence: u8, arousal: u8, difficulty: u8) -> Self {
        Self {
            valence,
            arousal,
            difficulty,
        }
    }
}

/// Inclusive ordinal range shared by every rating dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScale {
    #[serde(default = "default_min")]
    pub min: u8,
    #[serde(default = "default_max")]
    pub max: u8,
}

fn default_min() -> u8 {
    1
}

fn default_max() -> u8 {
    7
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
        }
    }
}

impl RatingScale {
    pub fn contains(&self, value: u8) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Midpoint, used as the initial slider position by clients
    pub fn midpoint(&self) -> u8 {
        self.min + (self.max - self.min) / 2
    }

    /// Check every dimension, reporting the first one out of range
    pub fn check(&self, ratings: &Ratings) -> Result<(), ScaleError> {
        self.ratings(
            ratings.valence.into(),
            ratings.arousal.into(),
            ratings.difficulty.into(),
        )
        .map(|_| ())
    }

    /// Build ratings from unchecked client values
    ///
    /// Accepts any integer so that negative or oversized input is reported as
    /// a scale violation rather than a decoding failure.
    pub fn ratings(&self, valence: i64, arousal: i64, difficulty: i64) -> Result<Ratings, ScaleError> {
        let valence = self.checked("valence", valence)?;
        let arousal = self.checked("arousal", arousal)?;
        let difficulty = self.checked("difficulty", difficulty)?;
        Ok(Ratings::new(valence, arousal, difficulty))
    }

    fn checked(&self, dimension: &'static str, value: i64) -> Result<u8, ScaleError> {
        u8::try_from(value)
            .ok()
            .filter(|v| self.contains(*v))
            .ok_or(ScaleError {
                dimension,
                value,
                min: self.min,
                max: self.max,
            })
    }
}
