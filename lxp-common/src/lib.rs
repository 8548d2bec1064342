//! # LXP Common Library
//!
//! Shared code for the listening-experiment services including:
//! - Error type and result alias
//! - Configuration file resolution and TOML loading
//! - Timestamp formatting
//! - Identifier generation

pub mod config;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
