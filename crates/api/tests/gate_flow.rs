//! End-to-end gate behavior through the router: blocked accounts are
//! cut off by the middleware on every route except their own gate
//! status.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use tower::util::ServiceExt;
use worklink_api::{AppState, auth_middleware, router as api_router};
use worklink_common::ModerationConfig;
use worklink_core::{
    GateService, ModerationService, NotificationService, SyncService, TicketService,
};
use worklink_db::{
    entities::user::{self, UserRole},
    repositories::{ModerationRepository, NotificationRepository, TicketRepository, UserRepository},
};

fn app(db: Arc<DatabaseConnection>) -> Router {
    let user_repo = UserRepository::new(db.clone());
    let notification_service = NotificationService::new(NotificationRepository::new(db.clone()));
    let ticket_service = TicketService::new(
        TicketRepository::new(db.clone()),
        user_repo.clone(),
        notification_service.clone(),
        ModerationConfig::default(),
    );
    let moderation_service = ModerationService::new(
        ModerationRepository::new(db.clone()),
        user_repo.clone(),
        notification_service.clone(),
        ModerationConfig::default(),
    );
    let sync_service = SyncService::new(
        notification_service.clone(),
        ticket_service.clone(),
        worklink_common::SyncConfig::default(),
    );

    let state = AppState {
        user_repo: user_repo.clone(),
        gate_service: GateService::new(user_repo),
        ticket_service,
        notification_service,
        moderation_service,
        sync_service,
    };

    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn suspended_user() -> user::Model {
    user::Model {
        id: "u1".to_string(),
        username: "alice".to_string(),
        username_lower: "alice".to_string(),
        name: None,
        role: UserRole::Client,
        token: Some("token_u1".to_string()),
        is_banned: false,
        suspended_until: Some((Utc::now() + Duration::days(7)).into()),
        suspension_reason: Some("abusive messages".to_string()),
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", "Bearer token_u1")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn suspended_user_is_blocked_on_privileged_routes() {
    // One query: the auth middleware's token lookup. The gate rejects
    // before the sync handler runs any of its own.
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[suspended_user()]])
            .into_connection(),
    );

    let response = app(db).oneshot(authed_get("/api/sync")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn suspended_user_can_still_read_gate_status() {
    // Token lookup, then the gate endpoint's own user fetch.
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[suspended_user()], [suspended_user()]])
            .into_connection(),
    );

    let response = app(db).oneshot(authed_get("/api/gate")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_request_is_unauthorized() {
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

    let request = Request::builder()
        .uri("/api/sync")
        .body(Body::empty())
        .unwrap();
    let response = app(db).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn clean_user_passes_the_gate() {
    let mut user = suspended_user();
    user.suspended_until = None;
    user.suspension_reason = None;

    // Token lookup, then the gate endpoint's user fetch.
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()], [user]])
            .into_connection(),
    );

    let response = app(db).oneshot(authed_get("/api/gate")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
