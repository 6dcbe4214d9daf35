//! Support ticket repository.
//!
//! All lifecycle transitions are filtered `update_many` statements so the
//! precondition and the write land in a single atomic UPDATE. A plain
//! read-then-write is unsafe for claim, escalate, and close under
//! concurrent requests.

use std::sync::Arc;

use crate::entities::{
    SupportTicket,
    support_ticket::{self, TicketStatus},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, sea_query::Expr,
};
use worklink_common::{AppError, AppResult};

/// Result of a compare-and-set claim attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// This caller won the claim.
    Claimed,
    /// The precondition no longer held; someone else got there first
    /// or the ticket left the open state.
    Lost,
}

/// Support ticket repository for database operations.
#[derive(Clone)]
pub struct TicketRepository {
    db: Arc<DatabaseConnection>,
}

impl TicketRepository {
    /// Create a new ticket repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new ticket.
    ///
    /// The `idx_support_ticket_one_active` unique index rejects a
    /// second non-closed ticket for the same requester; that surfaces
    /// here as a conflict, not a database error.
    pub async fn create(
        &self,
        model: support_ticket::ActiveModel,
    ) -> AppResult<support_ticket::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(
                    "Requester already has an active ticket".to_string(),
                ),
                _ => AppError::Database(e.to_string()),
            })
    }

    /// Find a ticket by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<support_ticket::Model>> {
        SupportTicket::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a ticket by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<support_ticket::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::TicketNotFound(id.to_string()))
    }

    /// Find the requester's active (non-closed) ticket, if any.
    pub async fn find_active_by_requester(
        &self,
        requester_id: &str,
    ) -> AppResult<Option<support_ticket::Model>> {
        SupportTicket::find()
            .filter(support_ticket::Column::RequesterId.eq(requester_id))
            .filter(support_ticket::Column::Status.ne(TicketStatus::Closed))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically claim an open, unassigned ticket for a moderator.
    ///
    /// First-writer-wins: the UPDATE only matches while `status = open`
    /// and `assignee_id IS NULL`, so of two concurrent claimers exactly
    /// one sees a row affected.
    pub async fn claim(
        &self,
        ticket_id: &str,
        moderator_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ClaimOutcome> {
        let result = SupportTicket::update_many()
            .filter(support_ticket::Column::Id.eq(ticket_id))
            .filter(support_ticket::Column::Status.eq(TicketStatus::Open))
            .filter(support_ticket::Column::AssigneeId.is_null())
            .col_expr(
                support_ticket::Column::Status,
                TicketStatus::Assigned.into(),
            )
            .col_expr(
                support_ticket::Column::AssigneeId,
                moderator_id.to_string().into(),
            )
            .col_expr(
                support_ticket::Column::LastActivityAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 1 {
            Ok(ClaimOutcome::Claimed)
        } else {
            Ok(ClaimOutcome::Lost)
        }
    }

    /// Atomically move an assigned ticket to the escalated state.
    ///
    /// Returns `true` if this call performed the transition. The
    /// assignee is retained as provenance.
    pub async fn escalate(&self, ticket_id: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let result = SupportTicket::update_many()
            .filter(support_ticket::Column::Id.eq(ticket_id))
            .filter(support_ticket::Column::Status.eq(TicketStatus::Assigned))
            .col_expr(
                support_ticket::Column::Status,
                TicketStatus::Escalated.into(),
            )
            .col_expr(
                support_ticket::Column::LastActivityAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Atomically close a ticket from any non-terminal state.
    ///
    /// Returns `true` if this call performed the transition; `false`
    /// means the ticket was already closed (or missing), which keeps
    /// `closed_at` and `closed_by` from the first closure intact.
    pub async fn close(
        &self,
        ticket_id: &str,
        closed_by: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = SupportTicket::update_many()
            .filter(support_ticket::Column::Id.eq(ticket_id))
            .filter(support_ticket::Column::Status.ne(TicketStatus::Closed))
            .col_expr(support_ticket::Column::Status, TicketStatus::Closed.into())
            .col_expr(
                support_ticket::Column::ClosedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .col_expr(
                support_ticket::Column::ClosedBy,
                closed_by.to_string().into(),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Refresh the activity timestamp (new request attached, moderator reply).
    pub async fn touch_activity(&self, ticket_id: &str, now: DateTime<Utc>) -> AppResult<()> {
        SupportTicket::update_many()
            .filter(support_ticket::Column::Id.eq(ticket_id))
            .filter(support_ticket::Column::Status.ne(TicketStatus::Closed))
            .col_expr(
                support_ticket::Column::LastActivityAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Escalate every assigned ticket idle since before `cutoff`.
    ///
    /// This is the lazy staleness sweep: called from queue reads, not
    /// from a background scheduler. Assignees are retained; tickets are
    /// never released back to open.
    pub async fn escalate_stale(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let result = SupportTicket::update_many()
            .filter(support_ticket::Column::Status.eq(TicketStatus::Assigned))
            .filter(
                support_ticket::Column::LastActivityAt
                    .lt(sea_orm::prelude::DateTimeWithTimeZone::from(cutoff)),
            )
            .col_expr(
                support_ticket::Column::Status,
                TicketStatus::Escalated.into(),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// List open (unclaimed) tickets, oldest first.
    pub async fn list_open(&self, limit: u64, offset: u64) -> AppResult<Vec<support_ticket::Model>> {
        SupportTicket::find()
            .filter(support_ticket::Column::Status.eq(TicketStatus::Open))
            .order_by_asc(support_ticket::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a moderator's active worklist.
    pub async fn list_for_assignee(
        &self,
        assignee_id: &str,
        limit: u64,
    ) -> AppResult<Vec<support_ticket::Model>> {
        SupportTicket::find()
            .filter(support_ticket::Column::AssigneeId.eq(assignee_id))
            .filter(support_ticket::Column::Status.ne(TicketStatus::Closed))
            .order_by_desc(support_ticket::Column::LastActivityAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List escalated tickets for the admin queue, oldest first.
    pub async fn list_escalated(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<support_ticket::Model>> {
        SupportTicket::find()
            .filter(support_ticket::Column::Status.eq(TicketStatus::Escalated))
            .order_by_asc(support_ticket::Column::LastActivityAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_ticket(id: &str, requester: &str, status: TicketStatus) -> support_ticket::Model {
        support_ticket::Model {
            id: id.to_string(),
            requester_id: requester.to_string(),
            subject: "Payment issue".to_string(),
            status,
            assignee_id: None,
            created_at: Utc::now().into(),
            last_activity_at: Utc::now().into(),
            closed_at: None,
            closed_by: None,
        }
    }

    #[tokio::test]
    async fn test_claim_wins_when_row_updated() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = TicketRepository::new(db);
        let outcome = repo.claim("t1", "mod1", Utc::now()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Claimed);
    }

    #[tokio::test]
    async fn test_claim_loses_when_precondition_gone() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = TicketRepository::new(db);
        let outcome = repo.claim("t1", "mod2", Utc::now()).await.unwrap();
        assert_eq!(outcome, ClaimOutcome::Lost);
    }

    #[tokio::test]
    async fn test_close_reports_noop_on_closed_ticket() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = TicketRepository::new(db);
        let transitioned = repo.close("t1", "u1", Utc::now()).await.unwrap();
        assert!(!transitioned);
    }

    #[tokio::test]
    async fn test_find_active_by_requester() {
        let ticket = test_ticket("t1", "u1", TicketStatus::Assigned);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ticket]])
                .into_connection(),
        );

        let repo = TicketRepository::new(db);
        let found = repo.find_active_by_requester("u1").await.unwrap();
        assert_eq!(found.map(|t| t.id), Some("t1".to_string()));
    }

    #[tokio::test]
    async fn test_escalate_stale_counts_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = TicketRepository::new(db);
        let swept = repo.escalate_stale(Utc::now()).await.unwrap();
        assert_eq!(swept, 3);
    }
}
