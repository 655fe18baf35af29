//! Demo seed data.
//!
//! One contracting org with two projects: a Gaithersburg kitchen remodel
//! whose case is complete enough to pass pre-check, and a Germantown
//! (county) remodel left deliberately incomplete so the checklist has
//! failures to show.

use std::collections::BTreeMap;

use chrono::Utc;

use permit_core::{
    resolve_ahj, AuthSession, CaseId, CaseStatus, FieldValue, Location, LocationId, Org, OrgId,
    OrgUser, PermitCase, Project, ProjectId, Role, SessionId,
};

use crate::{Storage, StorageResult};

/// Demo user the seed session belongs to.
pub const SEED_USER_EMAIL: &str = "pat@chesapeake-renovations.example";

/// Bearer token for the seeded session.
pub const SEED_SESSION_TOKEN: &str = "demo-session-token";

/// Identifiers of the seeded records.
#[derive(Debug, Clone)]
pub struct SeedSummary {
    pub org_id: OrgId,
    pub ready_case_id: CaseId,
    pub incomplete_case_id: CaseId,
}

/// Populate a store with demo records. Idempotence is not attempted;
/// call once per process.
pub fn seed_demo_data(store: &dyn Storage) -> StorageResult<SeedSummary> {
    let now = Utc::now();

    let org = store.create_org(Org {
        id: OrgId::new(),
        name: "Chesapeake Renovations LLC".to_string(),
        created_at: now,
    })?;

    store.create_org_user(OrgUser {
        org_id: org.id,
        user_email: SEED_USER_EMAIL.to_string(),
        role: Role::Owner,
        created_at: now,
    })?;

    store.create_session(AuthSession {
        id: SessionId::new(),
        user_email: SEED_USER_EMAIL.to_string(),
        token: SEED_SESSION_TOKEN.to_string(),
        expires_at: now + chrono::Duration::days(7),
        created_at: now,
    })?;

    // Gaithersburg kitchen remodel, ready for pre-check.
    let gaithersburg = store.create_location(Location {
        id: LocationId::new(),
        address1: "12 Summit Hall Rd".to_string(),
        address2: None,
        city: "Gaithersburg".to_string(),
        state: "MD".to_string(),
        postal: "20877".to_string(),
        parcel_id: Some("09-1234567".to_string()),
        ahj_key: resolve_ahj("Gaithersburg", "MD").expect("seed city resolves"),
        created_at: now,
    })?;

    let kitchen = store.create_project(Project {
        id: ProjectId::new(),
        org_id: org.id,
        name: "Hartley kitchen remodel".to_string(),
        location_id: gaithersburg.id,
        valuation_usd: Some(5_000),
        trade_tags: vec!["electrical".to_string(), "plumbing".to_string()],
        created_at: now,
        updated_at: now,
    })?;

    let mut forms = BTreeMap::new();
    forms.insert(
        "scope_description".to_string(),
        FieldValue::Text(
            "Full kitchen remodel: new cabinets, counters, and relocated sink line.".to_string(),
        ),
    );
    forms.insert(
        "contractor_license".to_string(),
        FieldValue::Text("MHIC-12345".to_string()),
    );
    forms.insert(
        "structural_changes".to_string(),
        FieldValue::Text("none".to_string()),
    );
    let mut attachments = BTreeMap::new();
    attachments.insert(
        "plans".to_string(),
        "s3://permitbase-demo/docs/hartley-plans.pdf".to_string(),
    );
    attachments.insert(
        "contractor_license".to_string(),
        "s3://permitbase-demo/docs/mhic-12345.pdf".to_string(),
    );

    let ready_case = store.create_case(PermitCase {
        id: CaseId::new(),
        org_id: org.id,
        project_id: kitchen.id,
        ahj_key: gaithersburg.ahj_key.clone(),
        permit_type: "residential_kitchen_remodel".to_string(),
        status: CaseStatus::Draft,
        portal_case_id: None,
        fee_estimate_usd: None,
        forms,
        attachments,
        created_at: now,
        updated_at: now,
    })?;

    // Germantown remodel in unincorporated county territory, with the
    // forms and attachments still missing.
    let germantown = store.create_location(Location {
        id: LocationId::new(),
        address1: "4401 Crystal Rock Dr".to_string(),
        address2: None,
        city: "Germantown".to_string(),
        state: "MD".to_string(),
        postal: "20874".to_string(),
        parcel_id: None,
        ahj_key: resolve_ahj("Germantown", "MD").expect("seed city resolves"),
        created_at: now,
    })?;

    let basement = store.create_project(Project {
        id: ProjectId::new(),
        org_id: org.id,
        name: "Crystal Rock kitchen refresh".to_string(),
        location_id: germantown.id,
        valuation_usd: Some(25_000),
        trade_tags: vec!["plumbing".to_string()],
        created_at: now,
        updated_at: now,
    })?;

    let incomplete_case = store.create_case(PermitCase {
        id: CaseId::new(),
        org_id: org.id,
        project_id: basement.id,
        ahj_key: germantown.ahj_key.clone(),
        permit_type: "residential_kitchen_remodel".to_string(),
        status: CaseStatus::Draft,
        portal_case_id: None,
        fee_estimate_usd: None,
        forms: BTreeMap::new(),
        attachments: BTreeMap::new(),
        created_at: now,
        updated_at: now,
    })?;

    tracing::info!(
        org = %org.id,
        ready_case = %ready_case.id,
        incomplete_case = %incomplete_case.id,
        "seeded demo data"
    );

    Ok(SeedSummary {
        org_id: org.id,
        ready_case_id: ready_case.id,
        incomplete_case_id: incomplete_case.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn seed_creates_coherent_records() {
        let store = MemoryStore::new();
        let summary = seed_demo_data(&store).unwrap();

        let ready = store.get_case(summary.ready_case_id).unwrap();
        assert_eq!(ready.ahj_key.as_str(), "us/md/gaithersburg");
        assert_eq!(ready.status, CaseStatus::Draft);
        assert!(ready.attachments.contains_key("plans"));

        let incomplete = store.get_case(summary.incomplete_case_id).unwrap();
        assert_eq!(incomplete.ahj_key.as_str(), "us/md/montgomery_county");
        assert!(incomplete.forms.is_empty());

        let project = store.get_project(ready.project_id).unwrap();
        assert_eq!(project.valuation_usd, Some(5_000));

        assert!(store
            .get_org_user(SEED_USER_EMAIL, summary.org_id)
            .is_some());
        assert!(store.get_session_by_token(SEED_SESSION_TOKEN).is_some());
    }
}
