//! Organization routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use permit_core::{Org, OrgId, OrgUser, PermitCase, Project, Role};

use crate::auth::{require_member, CallerIdentity};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrgRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub user_email: String,
    #[schema(value_type = String)]
    pub role: Role,
}

/// Build the organization router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orgs", post(create_org).get(list_orgs))
        .route("/v1/orgs/:id/members", post(add_member))
        .route("/v1/orgs/:id/projects", get(list_projects))
        .route("/v1/orgs/:id/cases", get(list_cases))
}

/// POST /v1/orgs — create an org with the caller as owner.
pub async fn create_org(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(body): Json<CreateOrgRequest>,
) -> Result<(StatusCode, Json<Org>), AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("org name must not be empty".to_string()));
    }

    let now = Utc::now();
    let org = state.store.create_org(Org {
        id: OrgId::new(),
        name: name.to_string(),
        created_at: now,
    })?;
    state.store.create_org_user(OrgUser {
        org_id: org.id,
        user_email: caller.user_email.clone(),
        role: Role::Owner,
        created_at: now,
    })?;

    tracing::info!(org = %org.id, owner = %caller.user_email, "org created");
    Ok((StatusCode::CREATED, Json(org)))
}

/// GET /v1/orgs — orgs the caller belongs to.
pub async fn list_orgs(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Json<Vec<Org>> {
    Json(state.store.orgs_for_user(&caller.user_email))
}

/// POST /v1/orgs/{id}/members — add a member (owners only).
pub async fn add_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(org_id): Path<OrgId>,
    Json(body): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<OrgUser>), AppError> {
    let membership = require_member(state.store.as_ref(), &caller, org_id)?;
    if membership.role != Role::Owner {
        return Err(AppError::Forbidden(
            "only owners can manage membership".to_string(),
        ));
    }

    let email = body.user_email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }

    let member = state.store.create_org_user(OrgUser {
        org_id,
        user_email: email,
        role: body.role,
        created_at: Utc::now(),
    })?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /v1/orgs/{id}/projects — all projects in the org.
pub async fn list_projects(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(org_id): Path<OrgId>,
) -> Result<Json<Vec<Project>>, AppError> {
    require_member(state.store.as_ref(), &caller, org_id)?;
    Ok(Json(state.store.projects_for_org(org_id)))
}

/// GET /v1/orgs/{id}/cases — all permit cases in the org.
pub async fn list_cases(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(org_id): Path<OrgId>,
) -> Result<Json<Vec<PermitCase>>, AppError> {
    require_member(state.store.as_ref(), &caller, org_id)?;
    Ok(Json(state.store.cases_for_org(org_id)))
}
