//! OpenAPI document, generated from the utoipa annotations on the
//! handlers and served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Aggregated OpenAPI 3 document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "permit-api",
        description = "Permit application workflow: AHJ resolution, jurisdiction packs, pre-check, fee estimation, packaging, and portal submission."
    ),
    paths(
        crate::auth::request_magic_link,
        crate::auth::redeem_magic_link,
        crate::routes::jurisdictions::list_jurisdictions,
        crate::routes::jurisdictions::resolve_jurisdiction,
        crate::routes::jurisdictions::get_jurisdiction,
        crate::routes::projects::create_project,
        crate::routes::cases::precheck_case,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::auth::MagicLinkRequest,
        crate::auth::MagicLinkResponse,
        crate::auth::SessionRequest,
        crate::auth::SessionResponse,
        crate::routes::jurisdictions::ResolveResponse,
        crate::routes::projects::CreateProjectRequest,
        crate::routes::projects::ProjectResponse,
        crate::routes::cases::CreateCaseRequest,
        crate::routes::cases::PackageResponse,
        crate::routes::cases::JobAccepted,
        crate::routes::cases::ScheduleInspectionRequest,
    )),
    tags(
        (name = "auth", description = "Magic-link authentication"),
        (name = "jurisdictions", description = "AHJ resolution and pack catalog"),
        (name = "projects", description = "Project management"),
        (name = "cases", description = "Permit case workflow"),
    )
)]
pub struct ApiDoc;

/// Router serving the document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/v1/auth/magic-link"));
        assert!(paths.contains_key("/v1/cases/{id}/precheck"));
        assert!(paths.contains_key("/v1/jurisdictions/resolve"));
    }
}
