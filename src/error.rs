//! Error types for the interpolation group coordinator.
//!
//! The coordinator itself never fails: precondition misses and unresolvable contexts are
//! routing decisions reported through [`crate::manager::Outcome`]. Errors here come from the
//! collaborators (annotation store, interpolation engine) and from configuration loading.

use crate::types::InterpolationUid;
use thiserror::Error;

/// Annotation store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Annotation not found: {0}")]
    AnnotationNotFound(String),

    #[error("Annotation store unavailable: {0}")]
    Unavailable(String),
}

/// Interpolation engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Synthesis failed for group {uid:?}: {reason}")]
    SynthesisFailed {
        uid: Option<InterpolationUid>,
        reason: String,
    },

    #[error("Deleting generated annotations failed for group {uid:?}: {reason}")]
    DeletionFailed {
        uid: Option<InterpolationUid>,
        reason: String,
    },

    #[error("Store error during interpolation: {0}")]
    Store(#[from] StoreError),
}

/// Top-level error surfaced by the manager, dispatcher and replay runner
#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Engine error: {0}")]
    EngineError(#[from] EngineError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<config::ConfigError> for InterpolationError {
    fn from(err: config::ConfigError) -> Self {
        InterpolationError::ConfigError(err.to_string())
    }
}
