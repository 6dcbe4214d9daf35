//! Notification endpoints.
//!
//! Polled by clients on the notification interval. Listing marks the
//! backlog read by default; the response still carries each row's
//! pre-flip read flag so new entries can be highlighted once.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use worklink_common::AppResult;
use worklink_db::entities::notification::{Model as NotificationModel, NotificationType};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// List notifications request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    /// Maximum results (default: 20, max: 100)
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Cursor for pagination (before this ID)
    pub until_id: Option<String>,
    /// Whether opening the list marks the backlog read (default: true).
    #[serde(default = "default_true")]
    pub mark_read: bool,
}

const fn default_limit() -> u64 {
    20
}

const fn default_true() -> bool {
    true
}

/// Notification response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub created_at: String,
    pub is_read: bool,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            created_at: n.created_at.to_rfc3339(),
            is_read: n.is_read,
            notification_type: n.notification_type,
            title: n.title,
            body: n.body,
            action_url: n.action_url,
        }
    }
}

/// Get notifications for the authenticated user.
async fn list_notifications(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let limit = req.limit.min(100);

    let notifications = if req.mark_read {
        state
            .notification_service
            .list_and_mark_read(&user.id, limit, req.until_id.as_deref())
            .await?
    } else {
        state
            .notification_service
            .list(&user.id, limit, req.until_id.as_deref())
            .await?
    };

    Ok(ApiResponse::ok(
        notifications.into_iter().map(Into::into).collect(),
    ))
}

/// Mark notification as read request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadRequest {
    pub notification_id: String,
}

/// Mark a notification as read. A repeat call is a no-op.
async fn mark_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<MarkAsReadRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .notification_service
        .mark_read(&user.id, &req.notification_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Count response for bulk operations.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub count: u64,
}

/// Mark all notifications as read.
async fn mark_all_as_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.mark_all_read(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Get unread notification count.
async fn unread_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.count_unread(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

/// Delete all of the caller's notifications.
async fn clear_all(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CountResponse>> {
    let count = state.notification_service.clear_all(&user.id).await?;
    Ok(ApiResponse::ok(CountResponse { count }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list_notifications))
        .route("/mark-read", post(mark_as_read))
        .route("/mark-all-read", post(mark_all_as_read))
        .route("/unread-count", post(unread_count))
        .route("/clear-all", post(clear_all))
}
