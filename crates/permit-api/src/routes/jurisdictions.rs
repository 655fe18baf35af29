//! Jurisdiction catalog routes.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use permit_core::{resolve_ahj, AhjKey};
use permit_pack::JurisdictionPack;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub city: String,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResolveResponse {
    /// The governing authority's jurisdiction key.
    pub ahj_key: String,
}

/// Build the jurisdiction router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/jurisdictions", get(list_jurisdictions))
        .route("/v1/jurisdictions/resolve", get(resolve_jurisdiction))
        .route("/v1/jurisdictions/*key", get(get_jurisdiction))
}

/// GET /v1/jurisdictions — every key with a loadable pack.
#[utoipa::path(
    get,
    path = "/v1/jurisdictions",
    responses((status = 200, description = "Available jurisdiction keys")),
    tag = "jurisdictions"
)]
pub async fn list_jurisdictions(State(state): State<AppState>) -> Json<Vec<String>> {
    let keys = state
        .loader
        .list_available()
        .into_iter()
        .map(|key| key.to_string())
        .collect();
    Json(keys)
}

/// GET /v1/jurisdictions/resolve — map a city/state to its AHJ key.
#[utoipa::path(
    get,
    path = "/v1/jurisdictions/resolve",
    params(
        ("city" = String, Query, description = "City name"),
        ("state" = String, Query, description = "State name or abbreviation"),
    ),
    responses(
        (status = 200, description = "Resolved jurisdiction key", body = ResolveResponse),
        (status = 422, description = "State outside supported coverage"),
    ),
    tag = "jurisdictions"
)]
pub async fn resolve_jurisdiction(
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, AppError> {
    let key = resolve_ahj(&query.city, &query.state)?;
    Ok(Json(ResolveResponse {
        ahj_key: key.to_string(),
    }))
}

/// GET /v1/jurisdictions/{key} — the full declarative pack.
#[utoipa::path(
    get,
    path = "/v1/jurisdictions/{key}",
    params(("key" = String, Path, description = "Jurisdiction key, e.g. us/md/gaithersburg")),
    responses(
        (status = 200, description = "The jurisdiction pack"),
        (status = 404, description = "No pack for this key"),
        (status = 422, description = "Malformed key"),
    ),
    tag = "jurisdictions"
)]
pub async fn get_jurisdiction(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<JurisdictionPack>, AppError> {
    let key = AhjKey::new(key).map_err(|err| AppError::Validation(err.to_string()))?;
    let pack = state.loader.load(&key)?;
    Ok(Json((*pack).clone()))
}
