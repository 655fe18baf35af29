//! Pack loading errors.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type PackResult<T> = Result<T, PackError>;

/// Errors raised while loading or validating a jurisdiction pack.
#[derive(Debug, Error)]
pub enum PackError {
    /// No configuration exists for the requested jurisdiction key.
    #[error("no jurisdiction pack found for {key}")]
    NotFound {
        /// The requested jurisdiction key.
        key: String,
    },

    /// Configuration exists but failed schema parsing or validation.
    #[error("jurisdiction pack for {key} is corrupt: {reason}")]
    Corrupt {
        /// The requested jurisdiction key.
        key: String,
        /// What failed, including the offending document.
        reason: String,
    },

    /// Filesystem error other than a missing pack.
    #[error("i/o error reading pack documents: {0}")]
    Io(#[from] std::io::Error),
}

impl PackError {
    pub(crate) fn corrupt(key: &permit_core::AhjKey, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
