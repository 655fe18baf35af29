//! # permit-portal — Jurisdiction Portal Boundary
//!
//! Government portals are an opaque capability behind [`PortalDriver`]:
//! `submit`, `poll_status`, `request_inspection`. The drivers shipped
//! here are deterministic mocks — a real deployment would put browser
//! automation or a vendor API behind the same trait, which is exactly
//! why the boundary is a trait.

pub mod mock;
pub mod package;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use permit_core::{CaseId, CaseStatus, FieldValue};

pub use mock::MockPortal;
pub use package::build_submission_package;

/// Errors surfaced by portal drivers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    /// No driver registered under the requested identifier.
    #[error("no portal driver registered for '{0}'")]
    UnknownDriver(String),

    /// The portal accepted the connection but refused the operation.
    #[error("portal rejected the operation: {0}")]
    Rejected(String),

    /// The portal could not be reached.
    #[error("portal unavailable: {0}")]
    Unavailable(String),
}

/// A submission package assembled from a case and its jurisdiction pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPackage {
    pub case_id: CaseId,
    /// Jurisdiction display name.
    pub jurisdiction: String,
    /// Permit type label.
    pub permit_type: String,
    /// Form template identifiers the jurisdiction requires.
    pub forms: Vec<String>,
    /// Submitted field values.
    pub fields: BTreeMap<String, FieldValue>,
    /// Attachment manifest: kind → stored document URI.
    pub attachments: BTreeMap<String, String>,
    pub built_at: DateTime<Utc>,
}

/// Receipt returned by a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub portal_case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

/// Status as reported by the portal, untranslated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalStatus {
    pub status: String,
    pub last_updated: DateTime<Utc>,
    /// Raw portal payload, kept for evidence.
    pub raw: serde_json::Value,
}

/// An inspection booking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRequest {
    pub inspection_type: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// Confirmation returned by a successful inspection booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionConfirmation {
    pub confirmation_id: String,
}

/// The opaque portal capability.
#[async_trait]
pub trait PortalDriver: Send + Sync + std::fmt::Debug {
    /// Submit a package; returns the portal's case identifier.
    async fn submit(&self, package: &SubmissionPackage) -> Result<SubmissionReceipt, PortalError>;

    /// Poll the portal for the current case status.
    async fn poll_status(&self, portal_case_id: &str) -> Result<PortalStatus, PortalError>;

    /// Request an inspection within a date window.
    async fn request_inspection(
        &self,
        portal_case_id: &str,
        request: &InspectionRequest,
    ) -> Result<InspectionConfirmation, PortalError>;
}

/// Translate a portal-reported status string into a case status.
/// Unrecognized statuses map to `None` so callers can leave the case
/// unchanged rather than guessing.
pub fn map_portal_status(status: &str) -> Option<CaseStatus> {
    match status.trim().to_lowercase().as_str() {
        "submitted" | "received" => Some(CaseStatus::Submitted),
        "under review" | "plans review" | "in review" | "pending" => Some(CaseStatus::Pending),
        "rfi" | "information requested" => Some(CaseStatus::Rfi),
        "approved" | "issued" => Some(CaseStatus::Approved),
        "rejected" | "denied" => Some(CaseStatus::Rejected),
        "closed" => Some(CaseStatus::Closed),
        _ => None,
    }
}

/// Registry mapping pack-declared driver identifiers to drivers.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: BTreeMap<String, Arc<dyn PortalDriver>>,
}

impl DriverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with mock drivers for the bundled Maryland
    /// jurisdictions.
    pub fn with_mock_drivers() -> Self {
        let mut registry = Self::new();
        registry.register("gaithersburg_portal", Arc::new(MockPortal::new("GTH")));
        registry.register("rockville_portal", Arc::new(MockPortal::new("RKV")));
        registry
    }

    /// Register a driver under an identifier.
    pub fn register(&mut self, id: impl Into<String>, driver: Arc<dyn PortalDriver>) {
        self.drivers.insert(id.into(), driver);
    }

    /// Look up a driver.
    ///
    /// # Errors
    ///
    /// [`PortalError::UnknownDriver`] when nothing is registered under
    /// the identifier.
    pub fn get(&self, id: &str) -> Result<Arc<dyn PortalDriver>, PortalError> {
        self.drivers
            .get(id)
            .cloned()
            .ok_or_else(|| PortalError::UnknownDriver(id.to_string()))
    }
}
