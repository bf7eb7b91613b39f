//! Error types for the gatekeeping engine.
//!
//! Only malformed input and internal faults are errors. Business outcomes
//! (unknown key, wrong device, expired window) are ordinary results; see
//! [`crate::Outcome`] and [`crate::ValidationResult`].

use thiserror::Error;

/// Result type for gatekeeping operations.
pub type GateResult<T> = Result<T, GateError>;

/// Errors that can occur in gatekeeping operations.
#[derive(Debug, Error)]
pub enum GateError {
    /// A required field is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Key generation kept colliding with already-issued keys.
    #[error("key generation exhausted retry budget")]
    KeyCollision,
}
