//! Account access gate endpoint.
//!
//! Mounted outside the gate middleware so a blocked user can still poll
//! their own block state for the countdown screen.

use axum::{Router, extract::State, routing::get};
use chrono::Utc;
use serde::Serialize;
use worklink_common::{AppResult, BlockKind};
use worklink_core::AccessDecision;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Gate status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlockKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Report the caller's own gate state.
async fn gate_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<GateResponse>> {
    // Re-read through the service so the countdown reflects a lift that
    // landed after this request's token lookup.
    let response = match state.gate_service.evaluate_user(&user.id, Utc::now()).await? {
        AccessDecision::Allowed => GateResponse {
            allowed: true,
            kind: None,
            until: None,
            reason: None,
        },
        AccessDecision::Blocked {
            kind,
            until,
            reason,
        } => GateResponse {
            allowed: false,
            kind: Some(kind),
            until: until.map(|ts| ts.to_rfc3339()),
            reason,
        },
    };
    Ok(ApiResponse::ok(response))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(gate_status))
}
