//! Persisted record types.
//!
//! These are the rows the storage collaborator holds. They carry no
//! behavior beyond small conveniences; all workflow logic lives in
//! permit-engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ahj::AhjKey;
use crate::form::FieldValue;
use crate::id::{CaseId, DocumentId, InspectionId, LocationId, OrgId, ProjectId, SessionId};
use crate::status::CaseStatus;

/// A contracting organization (tenant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Org {
    pub id: OrgId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Membership role within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Staff,
    ReadOnly,
}

impl Role {
    /// Whether this role may mutate org data.
    pub fn can_write(&self) -> bool {
        matches!(self, Self::Owner | Self::Staff)
    }
}

/// A user's membership in an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgUser {
    pub org_id: OrgId,
    pub user_email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A physical location with its resolved jurisdiction key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<String>,
    /// Resolved at creation time and immutable thereafter.
    pub ahj_key: AhjKey,
    pub created_at: DateTime<Utc>,
}

/// A construction project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub org_id: OrgId,
    pub name: String,
    pub location_id: LocationId,
    /// Declared construction cost in whole USD; basis for tiered fees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_usd: Option<i64>,
    /// Trades involved, e.g. "electrical", "plumbing".
    #[serde(default)]
    pub trade_tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A permit application case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermitCase {
    pub id: CaseId,
    pub org_id: OrgId,
    pub project_id: ProjectId,
    pub ahj_key: AhjKey,
    /// Must name a permit type known to the jurisdiction's pack; an
    /// unknown type is rejected at pre-check, never defaulted.
    pub permit_type: String,
    pub status: CaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portal_case_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_estimate_usd: Option<i64>,
    /// Submitted form field values.
    #[serde(default)]
    pub forms: BTreeMap<String, FieldValue>,
    /// Attachment manifest: kind → stored document URI.
    #[serde(default)]
    pub attachments: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a completed inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionResult {
    Pass,
    Fail,
    Partial,
}

/// An inspection requested or performed for a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub id: InspectionId,
    pub case_id: CaseId,
    pub inspection_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<InspectionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A stored document (plans, licenses, insurance certificates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub org_id: OrgId,
    /// Document kind, e.g. "plans", "site_plan", "license".
    pub kind: String,
    /// Object-store URI.
    pub uri: String,
    /// SHA-256 hex digest of the stored bytes.
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

/// An authenticated bearer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: SessionId,
    pub user_email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the session is still valid at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
