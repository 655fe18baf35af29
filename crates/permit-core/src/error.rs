//! Error types shared across the core domain vocabulary.

use thiserror::Error;

/// Validation failures for core value types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A jurisdiction key failed structural validation.
    #[error("invalid jurisdiction key: {0}")]
    InvalidAhjKey(String),
}

/// AHJ resolution failures.
///
/// Resolution is total within a supported state, so the only failure mode
/// is an unsupported state. Surfaced to HTTP callers as a client error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The state is outside the coverage map.
    #[error("no permitting authority coverage for {city}, {state}")]
    UnsupportedJurisdiction {
        /// City as submitted by the caller.
        city: String,
        /// State as submitted by the caller.
        state: String,
    },
}
