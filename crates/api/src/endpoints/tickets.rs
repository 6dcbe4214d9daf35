//! Support ticket endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;
use worklink_common::{AppError, AppResult};
use worklink_core::{CloseOutcome, EscalateOutcome, TicketCreation};
use worklink_db::entities::support_ticket::{Model as TicketModel, TicketStatus};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Ticket response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub id: String,
    pub requester_id: String,
    pub subject: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    pub created_at: String,
    pub last_activity_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,
}

impl From<TicketModel> for TicketResponse {
    fn from(t: TicketModel) -> Self {
        Self {
            id: t.id,
            requester_id: t.requester_id,
            subject: t.subject,
            status: t.status,
            assignee_id: t.assignee_id,
            created_at: t.created_at.to_rfc3339(),
            last_activity_at: t.last_activity_at.to_rfc3339(),
            closed_at: t.closed_at.map(|ts| ts.to_rfc3339()),
            closed_by: t.closed_by,
        }
    }
}

/// Create ticket request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    /// What the ticket is about.
    #[validate(length(min = 1, max = 500))]
    pub subject: String,
}

/// Create ticket response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketResponse {
    pub ticket: TicketResponse,
    /// True when the request attached to an existing active ticket
    /// instead of opening a new one.
    pub attached: bool,
}

/// Open a support ticket (or attach to the caller's active one).
async fn create_ticket(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateTicketRequest>,
) -> AppResult<ApiResponse<CreateTicketResponse>> {
    req.validate()?;

    let outcome = state
        .ticket_service
        .create(&user, &req.subject, Utc::now())
        .await?;

    let attached = matches!(outcome, TicketCreation::Attached(_));
    Ok(ApiResponse::ok(CreateTicketResponse {
        ticket: outcome.ticket().clone().into(),
        attached,
    }))
}

/// Fetch a ticket. Visible to its requester, its assignee, and staff.
async fn get_ticket(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<TicketResponse>> {
    let ticket = state.ticket_service.get(&id).await?;

    let visible = user.role.is_staff()
        || ticket.requester_id == user.id
        || ticket.assignee_id.as_deref() == Some(user.id.as_str());
    if !visible {
        return Err(AppError::Forbidden(
            "Not a participant in this ticket".to_string(),
        ));
    }

    Ok(ApiResponse::ok(ticket.into()))
}

/// Claim an open ticket.
async fn claim_ticket(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<TicketResponse>> {
    let ticket = state.ticket_service.claim(&user, &id, Utc::now()).await?;
    Ok(ApiResponse::ok(ticket.into()))
}

/// Escalation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalateResponse {
    pub outcome: &'static str,
    pub ticket: TicketResponse,
}

/// Escalate a ticket to the admin pool.
async fn escalate_ticket(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<EscalateResponse>> {
    let outcome = state.ticket_service.escalate(&user, &id, Utc::now()).await?;
    let ticket = state.ticket_service.get(&id).await?;

    let outcome = match outcome {
        EscalateOutcome::Escalated => "escalated",
        EscalateOutcome::AlreadyEscalated => "alreadyEscalated",
        EscalateOutcome::AlreadyClosed => "alreadyClosed",
    };
    Ok(ApiResponse::ok(EscalateResponse {
        outcome,
        ticket: ticket.into(),
    }))
}

/// Close response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseResponse {
    /// True when the ticket was already closed and this call changed
    /// nothing.
    pub already_closed: bool,
    pub ticket: TicketResponse,
}

/// Close a ticket. Idempotent: a repeat close returns the current state.
async fn close_ticket(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<CloseResponse>> {
    let (already_closed, ticket) = match state.ticket_service.close(&user, &id, Utc::now()).await? {
        CloseOutcome::Closed(t) => (false, t),
        CloseOutcome::AlreadyClosed(t) => (true, t),
    };
    Ok(ApiResponse::ok(CloseResponse {
        already_closed,
        ticket: ticket.into(),
    }))
}

/// Queue pagination query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueQuery {
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

const fn default_limit() -> u64 {
    50
}

fn require_staff(user: &worklink_db::entities::user::Model) -> AppResult<()> {
    if user.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Moderation staff only".to_string(),
        ))
    }
}

/// The moderator queue: open, unclaimed tickets.
async fn open_queue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(q): Query<QueueQuery>,
) -> AppResult<ApiResponse<Vec<TicketResponse>>> {
    require_staff(&user)?;
    let tickets = state
        .ticket_service
        .open_queue(Utc::now(), q.limit.min(100), q.offset)
        .await?;
    Ok(ApiResponse::ok(tickets.into_iter().map(Into::into).collect()))
}

/// The caller's assigned worklist.
async fn assigned_queue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(q): Query<QueueQuery>,
) -> AppResult<ApiResponse<Vec<TicketResponse>>> {
    require_staff(&user)?;
    let tickets = state
        .ticket_service
        .worklist(&user.id, Utc::now(), q.limit.min(100))
        .await?;
    Ok(ApiResponse::ok(tickets.into_iter().map(Into::into).collect()))
}

/// The admin queue: escalated tickets, longest-waiting first.
async fn admin_queue(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(q): Query<QueueQuery>,
) -> AppResult<ApiResponse<Vec<TicketResponse>>> {
    if user.role != worklink_db::entities::user::UserRole::Admin {
        return Err(AppError::Forbidden("Admins only".to_string()));
    }
    let tickets = state
        .ticket_service
        .admin_queue(Utc::now(), q.limit.min(100), q.offset)
        .await?;
    Ok(ApiResponse::ok(tickets.into_iter().map(Into::into).collect()))
}

/// The caller's active ticket, if any.
async fn active_ticket(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Option<TicketResponse>>> {
    let ticket = state.ticket_service.active_for_requester(&user.id).await?;
    Ok(ApiResponse::ok(ticket.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_ticket))
        .route("/open", get(open_queue))
        .route("/assigned", get(assigned_queue))
        .route("/admin-queue", get(admin_queue))
        .route("/active", get(active_ticket))
        .route("/{id}", get(get_ticket))
        .route("/{id}/claim", post(claim_ticket))
        .route("/{id}/escalate", post(escalate_ticket))
        .route("/{id}/close", post(close_ticket))
}
