//! Moderation endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;
use worklink_common::{AppError, AppResult};
use worklink_core::SuspensionAction;
use worklink_db::entities::{suspension_record, user};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Suspend or ban request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuspendRequest {
    pub user_id: String,
    /// Permanent ban when true; `days` is ignored.
    #[serde(default)]
    pub permanent: bool,
    /// Suspension length in days (required unless permanent).
    pub days: Option<i64>,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// Suspension record response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspensionRecordResponse {
    pub id: String,
    pub user_id: String,
    pub moderator_id: String,
    pub reason: String,
    pub permanent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifted_by: Option<String>,
}

impl From<suspension_record::Model> for SuspensionRecordResponse {
    fn from(r: suspension_record::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            moderator_id: r.moderator_id,
            reason: r.reason,
            permanent: r.permanent,
            expires_at: r.expires_at.map(|ts| ts.to_rfc3339()),
            created_at: r.created_at.to_rfc3339(),
            lifted_at: r.lifted_at.map(|ts| ts.to_rfc3339()),
            lifted_by: r.lifted_by,
        }
    }
}

/// Apply a ban or suspension.
async fn suspend(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SuspendRequest>,
) -> AppResult<ApiResponse<SuspensionRecordResponse>> {
    req.validate()?;

    let action = if req.permanent {
        SuspensionAction::Permanent { reason: req.reason }
    } else {
        let days = req.days.ok_or_else(|| {
            AppError::BadRequest("days is required for a temporary suspension".to_string())
        })?;
        SuspensionAction::Temporary {
            days,
            reason: req.reason,
        }
    };

    let record = state
        .moderation_service
        .apply(&actor, &req.user_id, action, Utc::now())
        .await?;
    Ok(ApiResponse::ok(record.into()))
}

/// Lift request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftRequest {
    pub user_id: String,
}

/// Lift response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiftResponse {
    /// False when the target had no live suspension to lift.
    pub lifted: bool,
}

/// Lift a temporary suspension early.
async fn lift(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<LiftRequest>,
) -> AppResult<ApiResponse<LiftResponse>> {
    let lifted = state
        .moderation_service
        .lift(&actor, &req.user_id, Utc::now())
        .await?;
    Ok(ApiResponse::ok(LiftResponse { lifted }))
}

/// Blocked user summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedUserResponse {
    pub id: String,
    pub username: String,
    pub is_banned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
}

impl From<user::Model> for BlockedUserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            is_banned: u.is_banned,
            suspended_until: u.suspended_until.map(|ts| ts.to_rfc3339()),
            suspension_reason: u.suspension_reason,
        }
    }
}

/// Listing pagination query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

fn require_staff(user: &user::Model) -> AppResult<()> {
    if user.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Moderation staff only".to_string()))
    }
}

/// List accounts currently blocked by the gate.
async fn list_suspensions(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<BlockedUserResponse>>> {
    require_staff(&actor)?;
    let users = state
        .moderation_service
        .list_blocked(Utc::now(), q.limit.min(100), q.offset)
        .await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

/// Moderation history for one account, newest first.
async fn user_history(
    AuthUser(actor): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(q): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<SuspensionRecordResponse>>> {
    require_staff(&actor)?;
    let records = state
        .moderation_service
        .history(&user_id, q.limit.min(100))
        .await?;
    Ok(ApiResponse::ok(
        records.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suspend", post(suspend))
        .route("/lift", post(lift))
        .route("/suspensions", get(list_suspensions))
        .route("/suspensions/{user_id}", get(user_history))
}
