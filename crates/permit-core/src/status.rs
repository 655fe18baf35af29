//! Permit case lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a permit case.
///
/// Progression: `Draft → PrecheckReady → Packaged → Submitted`, then
/// portal-driven movement through `Rfi`/`Pending` to `Approved` or
/// `Rejected`, and finally `Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Case is being drafted; nothing validated yet.
    Draft,
    /// Pre-check passed; fee estimate recorded.
    PrecheckReady,
    /// Submission package assembled.
    Packaged,
    /// Submitted to the jurisdiction portal.
    Submitted,
    /// Jurisdiction issued a request for information.
    Rfi,
    /// Under review at the jurisdiction.
    Pending,
    /// Permit approved.
    Approved,
    /// Permit rejected.
    Rejected,
    /// Case closed (terminal).
    Closed,
}

impl CaseStatus {
    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether the case has been handed to the jurisdiction portal.
    pub fn is_with_jurisdiction(&self) -> bool {
        matches!(self, Self::Submitted | Self::Rfi | Self::Pending)
    }

    /// Stable string form, matching the serialized representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PrecheckReady => "precheck_ready",
            Self::Packaged => "packaged",
            Self::Submitted => "submitted",
            Self::Rfi => "rfi",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
