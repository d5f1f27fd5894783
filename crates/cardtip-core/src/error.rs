#![forbid(unsafe_code)]

//! Error type for the few operations that can be misused.
//!
//! Everything on the hover path degrades silently; only lifecycle misuse and
//! bad configuration input are reported.

use thiserror::Error;

/// Errors surfaced by the tooltip engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardtipError {
    /// `enable` called while listeners are already attached.
    #[error("hover controller is already enabled")]
    AlreadyEnabled,
    /// The controller was disposed; it cannot be enabled again.
    #[error("hover controller was disposed and cannot be reused")]
    Disposed,
    /// Configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for CardtipError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
