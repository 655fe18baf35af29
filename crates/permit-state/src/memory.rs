//! In-memory record store.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use permit_core::{
    AuditEvent, AuthSession, CaseId, DocumentId, DocumentRecord, EventId, InspectionId,
    InspectionRecord, Location, LocationId, Org, OrgId, OrgUser, PermitCase, Project, ProjectId,
};

use crate::{CasePatch, Storage, StorageError, StorageResult};

#[derive(Default)]
struct Inner {
    orgs: BTreeMap<OrgId, Org>,
    org_users: Vec<OrgUser>,
    locations: BTreeMap<LocationId, Location>,
    projects: BTreeMap<ProjectId, Project>,
    cases: BTreeMap<CaseId, PermitCase>,
    inspections: BTreeMap<InspectionId, InspectionRecord>,
    documents: BTreeMap<DocumentId, DocumentRecord>,
    events: BTreeMap<EventId, AuditEvent>,
    sessions: Vec<AuthSession>,
}

/// Process-local [`Storage`] implementation backed by a single
/// `parking_lot::RwLock`. Reads take the shared lock; all writes are
/// serialized, which is what makes the overridden
/// [`Storage::update_case_with_event`] genuinely atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply_patch(case: &mut PermitCase, patch: CasePatch) {
        if let Some(status) = patch.status {
            case.status = status;
        }
        if let Some(fee) = patch.fee_estimate_usd {
            case.fee_estimate_usd = Some(fee);
        }
        if let Some(portal_case_id) = patch.portal_case_id {
            case.portal_case_id = Some(portal_case_id);
        }
        if let Some(forms) = patch.forms {
            case.forms = forms;
        }
        if let Some(attachments) = patch.attachments {
            case.attachments = attachments;
        }
        case.updated_at = Utc::now();
    }
}

impl Storage for MemoryStore {
    fn create_org(&self, org: Org) -> StorageResult<Org> {
        let mut inner = self.inner.write();
        inner.orgs.insert(org.id, org.clone());
        Ok(org)
    }

    fn get_org(&self, id: OrgId) -> StorageResult<Org> {
        self.inner
            .read()
            .orgs
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Org", id))
    }

    fn create_org_user(&self, member: OrgUser) -> StorageResult<OrgUser> {
        let mut inner = self.inner.write();
        if inner
            .org_users
            .iter()
            .any(|m| m.org_id == member.org_id && m.user_email == member.user_email)
        {
            return Err(StorageError::Conflict(format!(
                "{} is already a member of org {}",
                member.user_email, member.org_id
            )));
        }
        inner.org_users.push(member.clone());
        Ok(member)
    }

    fn get_org_user(&self, user_email: &str, org_id: OrgId) -> Option<OrgUser> {
        self.inner
            .read()
            .org_users
            .iter()
            .find(|m| m.org_id == org_id && m.user_email == user_email)
            .cloned()
    }

    fn orgs_for_user(&self, user_email: &str) -> Vec<Org> {
        let inner = self.inner.read();
        inner
            .org_users
            .iter()
            .filter(|m| m.user_email == user_email)
            .filter_map(|m| inner.orgs.get(&m.org_id).cloned())
            .collect()
    }

    fn create_location(&self, location: Location) -> StorageResult<Location> {
        let mut inner = self.inner.write();
        inner.locations.insert(location.id, location.clone());
        Ok(location)
    }

    fn get_location(&self, id: LocationId) -> StorageResult<Location> {
        self.inner
            .read()
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Location", id))
    }

    fn create_project(&self, project: Project) -> StorageResult<Project> {
        let mut inner = self.inner.write();
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn get_project(&self, id: ProjectId) -> StorageResult<Project> {
        self.inner
            .read()
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Project", id))
    }

    fn projects_for_org(&self, org_id: OrgId) -> Vec<Project> {
        self.inner
            .read()
            .projects
            .values()
            .filter(|p| p.org_id == org_id)
            .cloned()
            .collect()
    }

    fn create_case(&self, case: PermitCase) -> StorageResult<PermitCase> {
        let mut inner = self.inner.write();
        inner.cases.insert(case.id, case.clone());
        Ok(case)
    }

    fn get_case(&self, id: CaseId) -> StorageResult<PermitCase> {
        self.inner
            .read()
            .cases
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("PermitCase", id))
    }

    fn update_case(&self, id: CaseId, patch: CasePatch) -> StorageResult<PermitCase> {
        let mut inner = self.inner.write();
        let case = inner
            .cases
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("PermitCase", id))?;
        Self::apply_patch(case, patch);
        Ok(case.clone())
    }

    fn replace_case(&self, case: PermitCase) -> StorageResult<PermitCase> {
        let mut inner = self.inner.write();
        if !inner.cases.contains_key(&case.id) {
            return Err(StorageError::not_found("PermitCase", case.id));
        }
        inner.cases.insert(case.id, case.clone());
        Ok(case)
    }

    fn cases_for_project(&self, project_id: ProjectId) -> Vec<PermitCase> {
        self.inner
            .read()
            .cases
            .values()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect()
    }

    fn cases_for_org(&self, org_id: OrgId) -> Vec<PermitCase> {
        self.inner
            .read()
            .cases
            .values()
            .filter(|c| c.org_id == org_id)
            .cloned()
            .collect()
    }

    fn create_inspection(&self, record: InspectionRecord) -> StorageResult<InspectionRecord> {
        let mut inner = self.inner.write();
        inner.inspections.insert(record.id, record.clone());
        Ok(record)
    }

    fn inspections_for_case(&self, case_id: CaseId) -> Vec<InspectionRecord> {
        self.inner
            .read()
            .inspections
            .values()
            .filter(|i| i.case_id == case_id)
            .cloned()
            .collect()
    }

    fn create_document(&self, document: DocumentRecord) -> StorageResult<DocumentRecord> {
        let mut inner = self.inner.write();
        inner.documents.insert(document.id, document.clone());
        Ok(document)
    }

    fn get_document(&self, id: DocumentId) -> StorageResult<DocumentRecord> {
        self.inner
            .read()
            .documents
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("Document", id))
    }

    fn append_event(&self, event: AuditEvent) -> StorageResult<AuditEvent> {
        let mut inner = self.inner.write();
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    fn events_for_entity(&self, entity: &str, entity_id: &str) -> Vec<AuditEvent> {
        let mut events: Vec<AuditEvent> = self
            .inner
            .read()
            .events
            .values()
            .filter(|e| e.entity == entity && e.entity_id == entity_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.created_at);
        events
    }

    fn create_session(&self, session: AuthSession) -> StorageResult<AuthSession> {
        let mut inner = self.inner.write();
        inner.sessions.push(session.clone());
        Ok(session)
    }

    fn get_session_by_token(&self, token: &str) -> Option<AuthSession> {
        self.inner
            .read()
            .sessions
            .iter()
            .find(|s| s.token == token)
            .cloned()
    }

    fn delete_session(&self, token: &str) {
        let mut inner = self.inner.write();
        inner.sessions.retain(|s| s.token != token);
    }

    /// Atomic under the single write lock: both mutations land or
    /// neither does.
    fn update_case_with_event(
        &self,
        id: CaseId,
        patch: CasePatch,
        event_fn: &dyn Fn(&PermitCase, &PermitCase) -> AuditEvent,
    ) -> StorageResult<PermitCase> {
        let mut inner = self.inner.write();
        let case = inner
            .cases
            .get_mut(&id)
            .ok_or_else(|| StorageError::not_found("PermitCase", id))?;
        let before = case.clone();
        Self::apply_patch(case, patch);
        let updated = case.clone();
        let event = event_fn(&before, &updated);
        inner.events.insert(event.id, event);
        Ok(updated)
    }
}
