//! # permit-state — Storage Collaborator
//!
//! The rest of the stack treats persistence as an external collaborator
//! behind the [`Storage`] trait: simple record CRUD, strongly consistent
//! within a call sequence. This crate supplies the trait and an
//! in-memory implementation ([`MemoryStore`]) suitable for tests and
//! single-process deployments.
//!
//! The one non-CRUD affordance is
//! [`Storage::update_case_with_event`]: the pre-check orchestrator must
//! persist a case update and its audit event as a single logical
//! transaction. Stores with native transactions override it; the default
//! implementation falls back to a compensating restore when the event
//! append fails.

pub mod memory;
pub mod seed;

use std::collections::BTreeMap;

use thiserror::Error;

use permit_core::{
    AuditEvent, AuthSession, CaseId, CaseStatus, DocumentId, DocumentRecord, FieldValue,
    InspectionRecord, Location, LocationId, Org, OrgId, OrgUser, PermitCase, Project, ProjectId,
};

pub use memory::MemoryStore;
pub use seed::{seed_demo_data, SeedSummary};

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "PermitCase".
        entity: &'static str,
        /// Identifier that missed.
        id: String,
    },

    /// A uniqueness or state constraint was violated.
    #[error("storage conflict: {0}")]
    Conflict(String),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Partial update for a permit case. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CasePatch {
    pub status: Option<CaseStatus>,
    pub fee_estimate_usd: Option<i64>,
    pub portal_case_id: Option<String>,
    pub forms: Option<BTreeMap<String, FieldValue>>,
    pub attachments: Option<BTreeMap<String, String>>,
}

impl CasePatch {
    /// Patch that only moves the lifecycle status.
    pub fn status(status: CaseStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Record store consumed by the workflow engine and the HTTP layer.
///
/// Implementations must be safe to share across request handlers.
pub trait Storage: Send + Sync {
    // -- Organizations ------------------------------------------------------

    fn create_org(&self, org: Org) -> StorageResult<Org>;
    fn get_org(&self, id: OrgId) -> StorageResult<Org>;
    fn create_org_user(&self, member: OrgUser) -> StorageResult<OrgUser>;
    /// Membership lookup; `None` means no access.
    fn get_org_user(&self, user_email: &str, org_id: OrgId) -> Option<OrgUser>;
    fn orgs_for_user(&self, user_email: &str) -> Vec<Org>;

    // -- Locations ----------------------------------------------------------

    fn create_location(&self, location: Location) -> StorageResult<Location>;
    fn get_location(&self, id: LocationId) -> StorageResult<Location>;

    // -- Projects -----------------------------------------------------------

    fn create_project(&self, project: Project) -> StorageResult<Project>;
    fn get_project(&self, id: ProjectId) -> StorageResult<Project>;
    fn projects_for_org(&self, org_id: OrgId) -> Vec<Project>;

    // -- Permit cases -------------------------------------------------------

    fn create_case(&self, case: PermitCase) -> StorageResult<PermitCase>;
    fn get_case(&self, id: CaseId) -> StorageResult<PermitCase>;
    /// Apply a patch and return the updated record.
    fn update_case(&self, id: CaseId, patch: CasePatch) -> StorageResult<PermitCase>;
    /// Overwrite a case wholesale. Used by compensating rollbacks.
    fn replace_case(&self, case: PermitCase) -> StorageResult<PermitCase>;
    fn cases_for_project(&self, project_id: ProjectId) -> Vec<PermitCase>;
    fn cases_for_org(&self, org_id: OrgId) -> Vec<PermitCase>;

    // -- Inspections --------------------------------------------------------

    fn create_inspection(&self, record: InspectionRecord) -> StorageResult<InspectionRecord>;
    fn inspections_for_case(&self, case_id: CaseId) -> Vec<InspectionRecord>;

    // -- Documents ----------------------------------------------------------

    fn create_document(&self, document: DocumentRecord) -> StorageResult<DocumentRecord>;
    fn get_document(&self, id: DocumentId) -> StorageResult<DocumentRecord>;

    // -- Audit events -------------------------------------------------------

    /// Append-only; events are never updated or deleted.
    fn append_event(&self, event: AuditEvent) -> StorageResult<AuditEvent>;
    fn events_for_entity(&self, entity: &str, entity_id: &str) -> Vec<AuditEvent>;

    // -- Auth sessions ------------------------------------------------------

    fn create_session(&self, session: AuthSession) -> StorageResult<AuthSession>;
    fn get_session_by_token(&self, token: &str) -> Option<AuthSession>;
    fn delete_session(&self, token: &str);

    // -- Composite ----------------------------------------------------------

    /// Apply a case patch and append an audit event as one logical
    /// transaction: the event must not be recorded if the update fails,
    /// and the update must not survive if the event append fails.
    ///
    /// `event_fn` receives the before and after records so the event can
    /// carry exact snapshots of both sides.
    ///
    /// The default implementation compensates by restoring the prior
    /// case record when the append fails. Transactional stores should
    /// override it.
    fn update_case_with_event(
        &self,
        id: CaseId,
        patch: CasePatch,
        event_fn: &dyn Fn(&PermitCase, &PermitCase) -> AuditEvent,
    ) -> StorageResult<PermitCase> {
        let before = self.get_case(id)?;
        let updated = self.update_case(id, patch)?;
        let event = event_fn(&before, &updated);
        if let Err(append_err) = self.append_event(event) {
            tracing::warn!(case = %id, error = %append_err, "event append failed; rolling case back");
            self.replace_case(before)?;
            return Err(append_err);
        }
        Ok(updated)
    }
}
