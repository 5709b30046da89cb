//! Common error types for Kashif
//!
//! No error in this taxonomy is fatal to the process; each is recoverable by
//! user retry or corrected input.

use crate::types::WizardStep;
use thiserror::Error;

/// Common result type for Kashif operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Kashif services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model acquisition never reached Ready; retry is user-initiated
    #[error("Model load failure: {0}")]
    ModelLoadFailure(String),

    /// Inference attempted before the model is ready
    ///
    /// An ordering error: callers must observe a Ready gateway first. Fails
    /// loud rather than silently skipping the classification.
    #[error("Classification model is not ready")]
    NotReady,

    /// Transient per-call inference failure; any prior decision is unchanged
    #[error("Inference failure: {0}")]
    InferenceFailure(String),

    /// Advance attempted while the current step's gate predicate is false
    #[error("Step gate failed at {step:?}: {reason}")]
    StepGateFailed {
        step: WizardStep,
        reason: &'static str,
    },

    /// Submission attempted before the analysis timeline completed
    #[error("Analysis has not completed")]
    AnalysisIncomplete,

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
