//! Error types for the check subsystem.

use thiserror::Error;

/// Errors that can occur in check registration and construction.
#[derive(Error, Debug)]
pub enum CheckError {
    /// A check with this ID is already registered
    #[error("check already registered: {check_id}")]
    Duplicate {
        /// The conflicting check ID
        check_id: String,
    },

    /// A check factory failed to construct its check
    #[error("failed to construct check: {reason}")]
    Construction {
        /// Reason the construction failed
        reason: String,
    },

    /// Check not found in the registry
    #[error("check not found: {check_id}")]
    NotFound {
        /// The check ID that was not found
        check_id: String,
    },

    /// Invalid check identifier or descriptor
    #[error("invalid check: {0}")]
    Invalid(#[from] sitelens_core::CoreError),
}

/// Result type for check operations.
pub type Result<T> = std::result::Result<T, CheckError>;
