//! Pre-check orchestration.
//!
//! Drives the sequence load pack → confirm permit type → validate →
//! checklist → fee estimate → persist. Persistence is a single logical
//! transaction: the case moves `draft → precheck_ready` with its fee
//! estimate, and the audit event lands with it or not at all. Any
//! failure before that point leaves the case untouched.

use serde::Serialize;
use thiserror::Error;

use permit_core::{AuditEvent, CaseId, CaseStatus, FormData, PermitCase};
use permit_pack::{PackError, PackLoader, PermitTypeDefinition};
use permit_state::{CasePatch, Storage, StorageError};

use crate::checklist::{build_checklist, ChecklistItem};
use crate::fees::{calculate, FeeCalculation};
use crate::validator::{validate, ValidationResult};

/// Audit action recorded for a completed pre-check.
const PRECHECK_ACTION: &str = "PRECHECK_COMPLETED";

/// Everything a caller needs to render the pre-check outcome.
#[derive(Debug, Clone, Serialize)]
pub struct PreCheckOutcome {
    pub checklist: Vec<ChecklistItem>,
    pub fee_estimate: FeeCalculation,
    pub validation: ValidationResult,
    pub permit_type_def: PermitTypeDefinition,
    /// The case as persisted, status `precheck_ready`.
    pub case: PermitCase,
}

/// Failures that abort a pre-check. Field-level validation and fee
/// calculation problems are data in the outcome, never errors here.
#[derive(Debug, Error)]
pub enum PreCheckError {
    /// Pack missing or corrupt for the case's jurisdiction.
    #[error(transparent)]
    Pack(#[from] PackError),

    /// The case names a permit type its jurisdiction does not offer.
    #[error("permit type '{permit_type}' is not offered by {jurisdiction}")]
    InvalidPermitType {
        permit_type: String,
        jurisdiction: String,
    },

    /// Case or project lookup failed, or the persist step failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Run the pre-check for a case and persist the outcome.
///
/// `actor` is recorded on the audit event (a user email, or "system").
///
/// # Errors
///
/// See [`PreCheckError`]. On any error the case record is unchanged.
pub fn run_precheck(
    storage: &dyn Storage,
    loader: &PackLoader,
    case_id: CaseId,
    actor: &str,
) -> Result<PreCheckOutcome, PreCheckError> {
    let case = storage.get_case(case_id)?;
    let project = storage.get_project(case.project_id)?;
    let pack = loader.load(&case.ahj_key)?;

    let Some(permit_type_def) = pack.permit_type(&case.permit_type) else {
        return Err(PreCheckError::InvalidPermitType {
            permit_type: case.permit_type.clone(),
            jurisdiction: case.ahj_key.to_string(),
        });
    };

    let form = FormData::from_case(&case, &project);
    let validation = validate(&pack, &case.permit_type, &form);
    let checklist = build_checklist(permit_type_def, &form, &validation);
    let fee_estimate = calculate(&pack, &case.permit_type, &form);

    tracing::info!(
        case = %case.id,
        jurisdiction = %case.ahj_key,
        permit_type = %case.permit_type,
        valid = validation.is_valid,
        fee_estimate_usd = fee_estimate.total_usd,
        "pre-check evaluated"
    );

    let patch = CasePatch {
        status: Some(CaseStatus::PrecheckReady),
        fee_estimate_usd: Some(fee_estimate.total_usd),
        ..Default::default()
    };
    let updated = storage.update_case_with_event(case.id, patch, &|before, after| {
        AuditEvent::record(
            before.org_id,
            "PermitCase",
            before.id,
            actor,
            PRECHECK_ACTION,
            Some(before),
            Some(after),
        )
    })?;

    Ok(PreCheckOutcome {
        checklist,
        fee_estimate,
        validation,
        permit_type_def: permit_type_def.clone(),
        case: updated,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use permit_core::{AhjKey, Location, LocationId, Org, OrgId, Project, ProjectId};
    use permit_state::{seed_demo_data, MemoryStore};

    use super::*;
    use crate::checklist::ChecklistStatus;

    fn bundled_loader() -> PackLoader {
        PackLoader::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../permit-pack/jurisdictions"
        ))
    }

    #[test]
    fn passing_case_moves_to_precheck_ready_with_fee() {
        let store = MemoryStore::new();
        let summary = seed_demo_data(&store).unwrap();
        let loader = bundled_loader();

        let outcome =
            run_precheck(&store, &loader, summary.ready_case_id, "pat@example.com").unwrap();

        assert!(outcome.validation.is_valid);
        // 125 base + 75 tier (5000 × 1.5%) + 75 plan review + 50 inspection.
        assert_eq!(outcome.fee_estimate.total_usd, 325);
        assert_eq!(outcome.case.status, CaseStatus::PrecheckReady);
        assert_eq!(outcome.case.fee_estimate_usd, Some(325));

        let persisted = store.get_case(summary.ready_case_id).unwrap();
        assert_eq!(persisted.status, CaseStatus::PrecheckReady);
        assert_eq!(persisted.fee_estimate_usd, Some(325));

        let events = store.events_for_entity("PermitCase", &summary.ready_case_id.to_string());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "PRECHECK_COMPLETED");
        assert_eq!(events[0].before.as_ref().unwrap()["status"], "draft");
        assert_eq!(
            events[0].after.as_ref().unwrap()["status"],
            "precheck_ready"
        );
    }

    #[test]
    fn precheck_is_idempotent_for_a_passing_case() {
        let store = MemoryStore::new();
        let summary = seed_demo_data(&store).unwrap();
        let loader = bundled_loader();

        let first =
            run_precheck(&store, &loader, summary.ready_case_id, "pat@example.com").unwrap();
        let second =
            run_precheck(&store, &loader, summary.ready_case_id, "pat@example.com").unwrap();

        assert_eq!(
            first.fee_estimate.total_usd,
            second.fee_estimate.total_usd
        );
        assert!(second.validation.is_valid);
        assert!(second.validation.errors.is_empty());
        assert_eq!(second.case.status, CaseStatus::PrecheckReady);
    }

    #[test]
    fn incomplete_case_still_gets_checklist_and_estimate() {
        let store = MemoryStore::new();
        let summary = seed_demo_data(&store).unwrap();
        let loader = bundled_loader();

        let outcome = run_precheck(
            &store,
            &loader,
            summary.incomplete_case_id,
            "pat@example.com",
        )
        .unwrap();

        // Validation problems are data, not an abort.
        assert!(!outcome.validation.is_valid);
        assert!(outcome
            .checklist
            .iter()
            .any(|item| item.status == ChecklistStatus::Failed));
        // County pricing at 25000: 150 base + 400 (1.6%) + 50 inspection.
        assert_eq!(outcome.fee_estimate.total_usd, 600);
        assert_eq!(outcome.case.status, CaseStatus::PrecheckReady);
    }

    #[test]
    fn unknown_permit_type_aborts_without_mutation() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let org = store
            .create_org(Org {
                id: OrgId::new(),
                name: "Test Org".to_string(),
                created_at: now,
            })
            .unwrap();
        let location = store
            .create_location(Location {
                id: LocationId::new(),
                address1: "1 Main St".to_string(),
                address2: None,
                city: "Rockville".to_string(),
                state: "MD".to_string(),
                postal: "20850".to_string(),
                parcel_id: None,
                ahj_key: AhjKey::new("us/md/rockville").unwrap(),
                created_at: now,
            })
            .unwrap();
        let project = store
            .create_project(Project {
                id: ProjectId::new(),
                org_id: org.id,
                name: "Test".to_string(),
                location_id: location.id,
                valuation_usd: Some(5_000),
                trade_tags: vec![],
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        let case = store
            .create_case(PermitCase {
                id: CaseId::new(),
                org_id: org.id,
                project_id: project.id,
                ahj_key: AhjKey::new("us/md/rockville").unwrap(),
                permit_type: "helipad_construction".to_string(),
                status: CaseStatus::Draft,
                portal_case_id: None,
                fee_estimate_usd: None,
                forms: BTreeMap::new(),
                attachments: BTreeMap::new(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let loader = bundled_loader();
        let err = run_precheck(&store, &loader, case.id, "system").unwrap_err();
        assert!(matches!(err, PreCheckError::InvalidPermitType { .. }));

        // Nothing persisted: status, estimate, and events all untouched.
        let unchanged = store.get_case(case.id).unwrap();
        assert_eq!(unchanged.status, CaseStatus::Draft);
        assert_eq!(unchanged.fee_estimate_usd, None);
        assert!(store
            .events_for_entity("PermitCase", &case.id.to_string())
            .is_empty());
    }

    #[test]
    fn unknown_jurisdiction_aborts_with_pack_error() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let org = store
            .create_org(Org {
                id: OrgId::new(),
                name: "Test Org".to_string(),
                created_at: now,
            })
            .unwrap();
        let location = store
            .create_location(Location {
                id: LocationId::new(),
                address1: "1 Main St".to_string(),
                address2: None,
                city: "Annapolis".to_string(),
                state: "MD".to_string(),
                postal: "21401".to_string(),
                parcel_id: None,
                ahj_key: AhjKey::new("us/md/annapolis").unwrap(),
                created_at: now,
            })
            .unwrap();
        let project = store
            .create_project(Project {
                id: ProjectId::new(),
                org_id: org.id,
                name: "Test".to_string(),
                location_id: location.id,
                valuation_usd: None,
                trade_tags: vec![],
                created_at: now,
                updated_at: now,
            })
            .unwrap();
        let case = store
            .create_case(PermitCase {
                id: CaseId::new(),
                org_id: org.id,
                project_id: project.id,
                ahj_key: AhjKey::new("us/md/annapolis").unwrap(),
                permit_type: "residential_kitchen_remodel".to_string(),
                status: CaseStatus::Draft,
                portal_case_id: None,
                fee_estimate_usd: None,
                forms: BTreeMap::new(),
                attachments: BTreeMap::new(),
                created_at: now,
                updated_at: now,
            })
            .unwrap();

        let err = run_precheck(&store, &bundled_loader(), case.id, "system").unwrap_err();
        assert!(matches!(err, PreCheckError::Pack(PackError::NotFound { .. })));
        assert_eq!(store.get_case(case.id).unwrap().status, CaseStatus::Draft);
    }

    #[test]
    fn missing_case_surfaces_storage_not_found() {
        let store = MemoryStore::new();
        let err = run_precheck(&store, &bundled_loader(), CaseId::new(), "system").unwrap_err();
        assert!(matches!(
            err,
            PreCheckError::Storage(StorageError::NotFound { .. })
        ));
    }
}
