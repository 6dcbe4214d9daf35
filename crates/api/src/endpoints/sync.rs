//! Polling sync endpoint.

use axum::{Router, extract::State, routing::get};
use chrono::Utc;
use worklink_common::AppResult;
use worklink_core::SyncSnapshot;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// One poll tick: intervals, unread badge count, active ticket.
async fn sync(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<SyncSnapshot>> {
    let snapshot = state.sync_service.snapshot(&user, Utc::now()).await?;
    Ok(ApiResponse::ok(snapshot))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(sync))
}
