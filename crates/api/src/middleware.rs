//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use worklink_core::{
    GateService, ModerationService, NotificationService, SyncService, TicketService,
    require_allowed,
};
use worklink_db::{entities::user, repositories::UserRepository};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_repo: UserRepository,
    pub gate_service: GateService,
    pub ticket_service: TicketService,
    pub notification_service: NotificationService,
    pub moderation_service: ModerationService,
    pub sync_service: SyncService,
}

/// Authentication middleware.
///
/// Resolves a bearer token to a user and stashes the model in request
/// extensions for the `AuthUser` extractor. An unknown or missing token
/// leaves the request anonymous; endpoints decide whether that is fatal.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(Some(user)) = state.user_repo.find_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

/// Account access gate middleware.
///
/// Evaluated on every authenticated request behind it, so a ban or
/// suspension takes effect on the target's very next request without
/// any session invalidation. `GET /api/gate` is mounted outside this
/// layer so a blocked user can still see their own block state.
pub async fn gate_middleware(req: Request<Body>, next: Next) -> Response {
    if let Some(user) = req.extensions().get::<user::Model>()
        && let Err(blocked) = require_allowed(user, Utc::now())
    {
        return blocked.into_response();
    }

    next.run(req).await
}
