//! Magic-link authentication and bearer-session middleware.
//!
//! Sign-in is passwordless: a caller requests a magic link for their
//! email, redeems the link's token for a bearer session, and presents
//! the session token on every subsequent request. Email delivery is
//! stubbed behind [`MailSender`] — the logging implementation prints the
//! link instead of sending it.
//!
//! The [`MagicLinkStore`] is an injected collaborator constructed once
//! per process, with an explicit expiry sweep on every issue — there is
//! no module-level token state anywhere.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

use permit_core::{AuthSession, OrgId, OrgUser, SessionId};
use permit_state::Storage;

use crate::error::AppError;
use crate::state::AppState;

/// Magic links expire after this long.
const MAGIC_LINK_TTL_MINUTES: i64 = 15;

/// Bearer sessions expire after this long.
const SESSION_TTL_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Magic links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MagicLink {
    email: String,
    expires_at: DateTime<Utc>,
}

/// Pending magic-link tokens, constructed per process and injected into
/// the app state.
#[derive(Default)]
pub struct MagicLinkStore {
    links: Mutex<HashMap<String, MagicLink>>,
}

impl MagicLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for an email. Expired tokens are swept on
    /// every issue so the map cannot grow unbounded.
    pub fn issue(&self, email: &str) -> String {
        let mut links = self.links.lock();
        let now = Utc::now();
        links.retain(|_, link| link.expires_at > now);

        let token = Uuid::new_v4().to_string();
        links.insert(
            token.clone(),
            MagicLink {
                email: email.to_string(),
                expires_at: now + Duration::minutes(MAGIC_LINK_TTL_MINUTES),
            },
        );
        token
    }

    /// Redeem a token. Single-use: the token is removed whether or not
    /// it is still valid.
    pub fn redeem(&self, token: &str) -> Option<String> {
        let mut links = self.links.lock();
        let link = links.remove(token)?;
        if link.expires_at <= Utc::now() {
            return None;
        }
        Some(link.email)
    }

    /// Drop every expired token.
    pub fn sweep_expired(&self) {
        let now = Utc::now();
        self.links.lock().retain(|_, link| link.expires_at > now);
    }

    /// Number of live tokens (observability and tests).
    pub fn len(&self) -> usize {
        self.links.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Mail delivery
// ---------------------------------------------------------------------------

/// Outbound mail seam. Real delivery is out of scope; implementations
/// may log, queue, or drop.
pub trait MailSender: Send + Sync {
    fn send_magic_link(&self, email: &str, link: &str);
}

/// Logs the link instead of delivering it.
pub struct LoggingMailSender;

impl MailSender for LoggingMailSender {
    fn send_magic_link(&self, email: &str, link: &str) {
        tracing::info!(email, link, "magic link issued (mail delivery stubbed)");
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// The authenticated caller, inserted into request extensions by the
/// auth middleware.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

/// Bearer-token middleware for the protected API surface.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

    let session = state
        .store
        .get_session_by_token(token)
        .ok_or_else(|| AppError::Unauthorized("invalid session token".to_string()))?;

    // Constant-time verification of the stored token against the
    // presented one.
    if !bool::from(session.token.as_bytes().ct_eq(token.as_bytes())) {
        return Err(AppError::Unauthorized("invalid session token".to_string()));
    }
    if !session.is_active(Utc::now()) {
        state.store.delete_session(token);
        return Err(AppError::Unauthorized("session expired".to_string()));
    }

    request.extensions_mut().insert(CallerIdentity {
        user_email: session.user_email,
    });
    Ok(next.run(request).await)
}

/// Require that the caller belongs to an org.
pub fn require_member(
    store: &dyn Storage,
    caller: &CallerIdentity,
    org_id: OrgId,
) -> Result<OrgUser, AppError> {
    store
        .get_org_user(&caller.user_email, org_id)
        .ok_or_else(|| AppError::Forbidden("not a member of this organization".to_string()))
}

/// Require membership with write permission.
pub fn require_writer(
    store: &dyn Storage,
    caller: &CallerIdentity,
    org_id: OrgId,
) -> Result<OrgUser, AppError> {
    let member = require_member(store, caller, org_id)?;
    if !member.role.can_write() {
        return Err(AppError::Forbidden(
            "read-only members cannot modify org data".to_string(),
        ));
    }
    Ok(member)
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MagicLinkResponse {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SessionRequest {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user_email: String,
    pub expires_at: DateTime<Utc>,
}

/// Unauthenticated auth routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/magic-link", post(request_magic_link))
        .route("/v1/auth/session", post(redeem_magic_link))
}

/// POST /v1/auth/magic-link — issue a sign-in link.
#[utoipa::path(
    post,
    path = "/v1/auth/magic-link",
    request_body = MagicLinkRequest,
    responses(
        (status = 202, description = "Magic link issued", body = MagicLinkResponse),
        (status = 422, description = "Malformed email"),
    ),
    tag = "auth"
)]
pub async fn request_magic_link(
    State(state): State<AppState>,
    Json(body): Json<MagicLinkRequest>,
) -> Result<(axum::http::StatusCode, Json<MagicLinkResponse>), AppError> {
    let email = body.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }

    let token = state.magic_links.issue(&email);
    let link = format!("/v1/auth/session?token={token}");
    state.mailer.send_magic_link(&email, &link);

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(MagicLinkResponse {
            status: "sent".to_string(),
        }),
    ))
}

/// POST /v1/auth/session — redeem a magic-link token for a bearer session.
#[utoipa::path(
    post,
    path = "/v1/auth/session",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 401, description = "Unknown or expired token"),
    ),
    tag = "auth"
)]
pub async fn redeem_magic_link(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = state
        .magic_links
        .redeem(&body.token)
        .ok_or_else(|| AppError::Unauthorized("unknown or expired magic link".to_string()))?;

    let now = Utc::now();
    let session = AuthSession {
        id: SessionId::new(),
        user_email: email.clone(),
        token: Uuid::new_v4().to_string(),
        expires_at: now + Duration::hours(SESSION_TTL_HOURS),
        created_at: now,
    };
    let session = state
        .store
        .create_session(session)
        .map_err(AppError::from)?;

    tracing::info!(user = %email, "session created");
    Ok(Json(SessionResponse {
        token: session.token,
        user_email: session.user_email,
        expires_at: session.expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_link_roundtrip_is_single_use() {
        let store = MagicLinkStore::new();
        let token = store.issue("pat@example.com");
        assert_eq!(store.redeem(&token).as_deref(), Some("pat@example.com"));
        assert_eq!(store.redeem(&token), None);
    }

    #[test]
    fn unknown_token_does_not_redeem() {
        let store = MagicLinkStore::new();
        assert_eq!(store.redeem("nope"), None);
    }

    #[test]
    fn issue_sweeps_expired_tokens() {
        let store = MagicLinkStore::new();
        let stale = store.issue("old@example.com");
        // Force-expire the stale link.
        store
            .links
            .lock()
            .get_mut(&stale)
            .unwrap()
            .expires_at = Utc::now() - Duration::minutes(1);

        store.issue("new@example.com");
        assert_eq!(store.len(), 1);
        assert_eq!(store.redeem(&stale), None);
    }

    #[test]
    fn sweep_drops_only_expired() {
        let store = MagicLinkStore::new();
        let live = store.issue("live@example.com");
        let stale = store.issue("stale@example.com");
        store
            .links
            .lock()
            .get_mut(&stale)
            .unwrap()
            .expires_at = Utc::now() - Duration::minutes(1);

        store.sweep_expired();
        assert_eq!(store.len(), 1);
        assert!(store.redeem(&live).is_some());
    }
}
