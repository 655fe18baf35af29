//! Permit case routes: creation, pre-check, packaging, submission, and
//! the audit trail.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use permit_core::{
    AuditEvent, CaseId, CaseStatus, FieldValue, PermitCase, ProjectId,
};
use permit_engine::{run_precheck, PreCheckOutcome};
use permit_portal::{build_submission_package, SubmissionPackage};
use permit_state::CasePatch;

use crate::auth::{require_member, require_writer, CallerIdentity};
use crate::error::AppError;
use crate::jobs::Job;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCaseRequest {
    #[schema(value_type = String)]
    pub project_id: ProjectId,
    pub permit_type: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub forms: BTreeMap<String, FieldValue>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub attachments: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageResponse {
    #[schema(value_type = Object)]
    pub package: SubmissionPackage,
    pub digest: String,
    #[schema(value_type = Object)]
    pub case: PermitCase,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobAccepted {
    #[schema(value_type = String)]
    pub job_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleInspectionRequest {
    pub inspection_type: String,
    #[schema(value_type = String)]
    pub window_start: NaiveDate,
    #[schema(value_type = String)]
    pub window_end: NaiveDate,
}

/// Build the case router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/cases", post(create_case))
        .route("/v1/cases/:id", get(get_case))
        .route("/v1/cases/:id/precheck", post(precheck_case))
        .route("/v1/cases/:id/package", post(package_case))
        .route("/v1/cases/:id/submit", post(submit_case))
        .route("/v1/cases/:id/poll-status", post(poll_case_status))
        .route("/v1/cases/:id/inspections", post(schedule_inspection))
        .route("/v1/cases/:id/events", get(list_events))
}

/// POST /v1/cases — open a draft case for a project.
///
/// The permit type is checked against the project's jurisdiction pack at
/// creation time: a case never exists with a type its jurisdiction does
/// not offer.
pub async fn create_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(body): Json<CreateCaseRequest>,
) -> Result<(StatusCode, Json<PermitCase>), AppError> {
    let project = state.store.get_project(body.project_id)?;
    require_writer(state.store.as_ref(), &caller, project.org_id)?;

    let location = state.store.get_location(project.location_id)?;
    let pack = state.loader.load(&location.ahj_key)?;
    if pack.permit_type(&body.permit_type).is_none() {
        return Err(AppError::InvalidPermitType(format!(
            "permit type '{}' is not offered by {}",
            body.permit_type, location.ahj_key
        )));
    }

    let now = Utc::now();
    let case = state.store.create_case(PermitCase {
        id: CaseId::new(),
        org_id: project.org_id,
        project_id: project.id,
        ahj_key: location.ahj_key.clone(),
        permit_type: body.permit_type,
        status: CaseStatus::Draft,
        portal_case_id: None,
        fee_estimate_usd: None,
        forms: body.forms,
        attachments: body.attachments,
        created_at: now,
        updated_at: now,
    })?;

    tracing::info!(case = %case.id, ahj = %case.ahj_key, "case created");
    Ok((StatusCode::CREATED, Json(case)))
}

/// GET /v1/cases/{id}.
pub async fn get_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<CaseId>,
) -> Result<Json<PermitCase>, AppError> {
    let case = state.store.get_case(id)?;
    require_member(state.store.as_ref(), &caller, case.org_id)?;
    Ok(Json(case))
}

/// POST /v1/cases/{id}/precheck — run the pre-submission check.
#[utoipa::path(
    post,
    path = "/v1/cases/{id}/precheck",
    params(("id" = String, Path, description = "Case identifier")),
    responses(
        (status = 200, description = "Checklist, fee estimate, and updated case"),
        (status = 404, description = "Unknown case or jurisdiction pack"),
        (status = 422, description = "Permit type not offered by the jurisdiction"),
    ),
    tag = "cases"
)]
pub async fn precheck_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<CaseId>,
) -> Result<Json<PreCheckOutcome>, AppError> {
    let case = state.store.get_case(id)?;
    require_member(state.store.as_ref(), &caller, case.org_id)?;

    let outcome = run_precheck(
        state.store.as_ref(),
        state.loader.as_ref(),
        id,
        &caller.user_email,
    )?;
    state.metrics.prechecks_total.inc();
    Ok(Json(outcome))
}

/// POST /v1/cases/{id}/package — assemble the submission package.
pub async fn package_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<CaseId>,
) -> Result<Json<PackageResponse>, AppError> {
    let case = state.store.get_case(id)?;
    require_writer(state.store.as_ref(), &caller, case.org_id)?;

    if case.status != CaseStatus::PrecheckReady {
        return Err(AppError::Conflict(format!(
            "case must be precheck_ready to package (currently {})",
            case.status
        )));
    }

    let pack = state.loader.load(&case.ahj_key)?;
    let definition = pack.permit_type(&case.permit_type).ok_or_else(|| {
        AppError::InvalidPermitType(format!(
            "permit type '{}' is not offered by {}",
            case.permit_type, case.ahj_key
        ))
    })?;

    let package = build_submission_package(&case, &pack, definition);
    let digest = package.digest();

    let updated = state.store.update_case_with_event(
        case.id,
        CasePatch::status(CaseStatus::Packaged),
        &|before, after| {
            AuditEvent::record(
                before.org_id,
                "PermitCase",
                before.id,
                &caller.user_email,
                "PACKAGE_BUILT",
                Some(before),
                Some(after),
            )
            .with_evidence(format!("package:{digest}"))
        },
    )?;

    Ok(Json(PackageResponse {
        package,
        digest,
        case: updated,
    }))
}

/// POST /v1/cases/{id}/submit — queue portal submission.
pub async fn submit_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<CaseId>,
) -> Result<(StatusCode, Json<JobAccepted>), AppError> {
    let case = state.store.get_case(id)?;
    require_writer(state.store.as_ref(), &caller, case.org_id)?;

    if case.status != CaseStatus::Packaged {
        return Err(AppError::Conflict(format!(
            "case must be packaged to submit (currently {})",
            case.status
        )));
    }

    let pack = state.loader.load(&case.ahj_key)?;
    let definition = pack.permit_type(&case.permit_type).ok_or_else(|| {
        AppError::InvalidPermitType(format!(
            "permit type '{}' is not offered by {}",
            case.permit_type, case.ahj_key
        ))
    })?;
    if definition.submission.portal_driver.is_none() {
        return Err(AppError::Validation(format!(
            "{} accepts '{}' applications by {:?}, not portal submission",
            case.ahj_key, case.permit_type, definition.submission.method
        )));
    }

    let job_id = state.jobs.enqueue(Job::SubmitPermit { case_id: id });
    state
        .metrics
        .jobs_enqueued_total
        .with_label_values(&["submit_permit"])
        .inc();
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id,
            status: "queued".to_string(),
        }),
    ))
}

/// POST /v1/cases/{id}/poll-status — queue a portal status poll.
pub async fn poll_case_status(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<CaseId>,
) -> Result<(StatusCode, Json<JobAccepted>), AppError> {
    let case = state.store.get_case(id)?;
    require_member(state.store.as_ref(), &caller, case.org_id)?;

    if case.portal_case_id.is_none() {
        return Err(AppError::Conflict(
            "case has not been submitted to a portal yet".to_string(),
        ));
    }

    let job_id = state.jobs.enqueue(Job::PollStatus { case_id: id });
    state
        .metrics
        .jobs_enqueued_total
        .with_label_values(&["poll_status"])
        .inc();
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id,
            status: "queued".to_string(),
        }),
    ))
}

/// POST /v1/cases/{id}/inspections — queue an inspection booking.
pub async fn schedule_inspection(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<CaseId>,
    Json(body): Json<ScheduleInspectionRequest>,
) -> Result<(StatusCode, Json<JobAccepted>), AppError> {
    let case = state.store.get_case(id)?;
    require_writer(state.store.as_ref(), &caller, case.org_id)?;

    if body.window_end < body.window_start {
        return Err(AppError::Validation(
            "inspection window end precedes start".to_string(),
        ));
    }
    if !case.status.is_with_jurisdiction() && case.status != CaseStatus::Approved {
        return Err(AppError::Conflict(format!(
            "inspections can be requested once the case is with the jurisdiction (currently {})",
            case.status
        )));
    }

    let pack = state.loader.load(&case.ahj_key)?;
    if pack.inspection_rule(&body.inspection_type).is_none() {
        return Err(AppError::Validation(format!(
            "inspection type '{}' is not offered by {}",
            body.inspection_type, case.ahj_key
        )));
    }

    let job_id = state.jobs.enqueue(Job::ScheduleInspection {
        case_id: id,
        inspection_type: body.inspection_type,
        window_start: body.window_start,
        window_end: body.window_end,
    });
    state
        .metrics
        .jobs_enqueued_total
        .with_label_values(&["schedule_inspection"])
        .inc();
    Ok((
        StatusCode::ACCEPTED,
        Json(JobAccepted {
            job_id,
            status: "queued".to_string(),
        }),
    ))
}

/// GET /v1/cases/{id}/events — the case's audit trail, oldest first.
pub async fn list_events(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<CaseId>,
) -> Result<Json<Vec<AuditEvent>>, AppError> {
    let case = state.store.get_case(id)?;
    require_member(state.store.as_ref(), &caller, case.org_id)?;
    Ok(Json(
        state
            .store
            .events_for_entity("PermitCase", &id.to_string()),
    ))
}
