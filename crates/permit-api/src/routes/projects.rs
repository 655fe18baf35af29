//! Project routes.
//!
//! Creating a project is where AHJ resolution happens: the location's
//! city/state pair is resolved to a jurisdiction key once, at write
//! time, and the key is immutable thereafter.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use permit_core::{
    resolve_ahj, validate_address, AddressInput, Location, LocationId, OrgId, Project, ProjectId,
};

use crate::auth::{require_member, require_writer, CallerIdentity};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    #[schema(value_type = String)]
    pub org_id: OrgId,
    pub name: String,
    #[schema(value_type = Object)]
    pub address: AddressInput,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub parcel_id: Option<String>,
    #[serde(default)]
    pub valuation_usd: Option<i64>,
    #[serde(default)]
    pub trade_tags: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    #[schema(value_type = Object)]
    pub project: Project,
    #[schema(value_type = Object)]
    pub location: Location,
}

/// Build the project router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/projects", post(create_project))
        .route("/v1/projects/:id", get(get_project))
}

/// POST /v1/projects — create a project and its resolved location.
#[utoipa::path(
    post,
    path = "/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 422, description = "Invalid address or unsupported jurisdiction"),
        (status = 403, description = "Caller cannot write to this org"),
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    require_writer(state.store.as_ref(), &caller, body.org_id)?;

    if body.name.trim().is_empty() {
        return Err(AppError::Validation(
            "project name must not be empty".to_string(),
        ));
    }
    if !validate_address(&body.address) {
        return Err(AppError::Validation(
            "address requires street, city, state, and a valid ZIP".to_string(),
        ));
    }
    if body.valuation_usd.is_some_and(|v| v < 0) {
        return Err(AppError::Validation(
            "valuation must not be negative".to_string(),
        ));
    }

    let ahj_key = resolve_ahj(&body.address.city, &body.address.state)?;

    let now = Utc::now();
    let location = state.store.create_location(Location {
        id: LocationId::new(),
        address1: body.address.address1.clone(),
        address2: body.address2.clone(),
        city: body.address.city.clone(),
        state: body.address.state.clone(),
        postal: body.address.postal.clone(),
        parcel_id: body.parcel_id.clone(),
        ahj_key,
        created_at: now,
    })?;

    let project = state.store.create_project(Project {
        id: ProjectId::new(),
        org_id: body.org_id,
        name: body.name.trim().to_string(),
        location_id: location.id,
        valuation_usd: body.valuation_usd,
        trade_tags: body.trade_tags.clone(),
        created_at: now,
        updated_at: now,
    })?;

    tracing::info!(
        project = %project.id,
        ahj = %location.ahj_key,
        "project created"
    );
    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse { project, location }),
    ))
}

/// GET /v1/projects/{id} — fetch a project with its location.
pub async fn get_project(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectResponse>, AppError> {
    let project = state.store.get_project(id)?;
    require_member(state.store.as_ref(), &caller, project.org_id)?;
    let location = state.store.get_location(project.location_id)?;
    Ok(Json(ProjectResponse { project, location }))
}
