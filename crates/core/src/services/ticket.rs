//! Support ticket lifecycle.
//!
//! The state machine is open -> assigned -> escalated -> closed, with
//! close reachable from every non-terminal state. All transitions go
//! through the repository's filtered UPDATEs, so concurrent claims,
//! escalations, and closes resolve to exactly one winner without locks.

use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::Set;
use worklink_common::{AppError, AppResult, IdGenerator, ModerationConfig};
use worklink_db::{
    entities::{
        notification::NotificationType,
        support_ticket::{self, TicketStatus},
        user::{self, UserRole},
    },
    repositories::{ClaimOutcome, TicketRepository, UserRepository},
};

use super::notification::NotificationService;

/// Cap on admin-pool fan-out per escalation.
const ADMIN_FANOUT_LIMIT: u64 = 100;

/// Result of a ticket creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketCreation {
    /// A fresh ticket was opened.
    Created(support_ticket::Model),
    /// The requester already had an active ticket; the request was
    /// attached to it instead of opening a second one.
    Attached(support_ticket::Model),
}

impl TicketCreation {
    /// The ticket the request ended up on, either way.
    #[must_use]
    pub fn ticket(&self) -> &support_ticket::Model {
        match self {
            Self::Created(t) | Self::Attached(t) => t,
        }
    }
}

/// Result of an escalation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalateOutcome {
    /// This call moved the ticket into the escalated state.
    Escalated,
    /// The ticket was already escalated; nothing changed.
    AlreadyEscalated,
    /// The ticket is closed; escalation is not possible.
    AlreadyClosed,
}

/// Result of a close request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// This call closed the ticket.
    Closed(support_ticket::Model),
    /// The ticket was already closed; `closed_at` and `closed_by` from
    /// the first closure are untouched.
    AlreadyClosed(support_ticket::Model),
}

/// Support ticket service.
#[derive(Clone)]
pub struct TicketService {
    ticket_repo: TicketRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    policy: ModerationConfig,
    id_gen: IdGenerator,
}

impl TicketService {
    /// Create a new ticket service.
    #[must_use]
    pub const fn new(
        ticket_repo: TicketRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
        policy: ModerationConfig,
    ) -> Self {
        Self {
            ticket_repo,
            user_repo,
            notifications,
            policy,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a support ticket, or attach to the requester's active one.
    ///
    /// One active ticket per requester: a second request while a ticket
    /// is open, assigned, or escalated refreshes that ticket's activity
    /// instead of creating a duplicate. Concurrent creates resolve the
    /// same way: a partial unique index backs the invariant, and the
    /// loser of the insert race attaches to the winner's ticket.
    pub async fn create(
        &self,
        requester: &user::Model,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<TicketCreation> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(AppError::Validation("Subject must not be empty".to_string()));
        }

        if let Some(existing) = self
            .ticket_repo
            .find_active_by_requester(&requester.id)
            .await?
        {
            self.ticket_repo.touch_activity(&existing.id, now).await?;
            tracing::debug!(
                ticket_id = %existing.id,
                requester_id = %requester.id,
                "Attached request to active ticket"
            );
            return Ok(TicketCreation::Attached(existing));
        }

        let model = support_ticket::ActiveModel {
            id: Set(self.id_gen.generate()),
            requester_id: Set(requester.id.clone()),
            subject: Set(subject.to_string()),
            status: Set(TicketStatus::Open),
            assignee_id: Set(None),
            created_at: Set(now.into()),
            last_activity_at: Set(now.into()),
            closed_at: Set(None),
            closed_by: Set(None),
        };

        let created = match self.ticket_repo.create(model).await {
            Ok(created) => created,
            Err(AppError::Conflict(_)) => {
                // A concurrent create slipped in between the pre-check
                // and the insert; attach to the winner instead.
                return match self
                    .ticket_repo
                    .find_active_by_requester(&requester.id)
                    .await?
                {
                    Some(existing) => {
                        self.ticket_repo.touch_activity(&existing.id, now).await?;
                        Ok(TicketCreation::Attached(existing))
                    }
                    // The winner's ticket was closed again in the
                    // window; the caller can simply retry.
                    None => Err(AppError::Conflict(
                        "Ticket creation raced with a close; retry".to_string(),
                    )),
                };
            }
            Err(e) => return Err(e),
        };
        tracing::info!(
            ticket_id = %created.id,
            requester_id = %requester.id,
            "Support ticket opened"
        );
        Ok(TicketCreation::Created(created))
    }

    /// Claim an open ticket for a moderator.
    ///
    /// First-writer-wins; the loser of a concurrent claim gets a
    /// conflict and must re-fetch the queue.
    pub async fn claim(
        &self,
        moderator: &user::Model,
        ticket_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<support_ticket::Model> {
        if !moderator.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderation staff may claim tickets".to_string(),
            ));
        }

        match self.ticket_repo.claim(ticket_id, &moderator.id, now).await? {
            ClaimOutcome::Claimed => {
                let ticket = self.ticket_repo.get_by_id(ticket_id).await?;
                self.notify_claimed(&ticket, moderator).await?;
                tracing::info!(
                    ticket_id,
                    moderator_id = %moderator.id,
                    "Ticket claimed"
                );
                Ok(ticket)
            }
            ClaimOutcome::Lost => {
                // Distinguish a lost race from a bad ID.
                let ticket = self.ticket_repo.get_by_id(ticket_id).await?;
                Err(AppError::Conflict(format!(
                    "Ticket {ticket_id} is {:?}, not open for claim",
                    ticket.status
                )))
            }
        }
    }

    /// Escalate a ticket to the admin pool.
    ///
    /// Moderators escalate tickets assigned to them; admins may pull in
    /// any active ticket, claiming an open one implicitly first. The
    /// assignee is retained as provenance. Escalating an already
    /// escalated ticket is a no-op, not an error.
    pub async fn escalate(
        &self,
        actor: &user::Model,
        ticket_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<EscalateOutcome> {
        if !actor.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderation staff may escalate tickets".to_string(),
            ));
        }

        let ticket = self.ticket_repo.get_by_id(ticket_id).await?;

        match ticket.status {
            TicketStatus::Closed => return Ok(EscalateOutcome::AlreadyClosed),
            TicketStatus::Escalated => return Ok(EscalateOutcome::AlreadyEscalated),
            TicketStatus::Open => {
                if actor.role != UserRole::Admin {
                    return Err(AppError::Conflict(
                        "Ticket must be claimed before escalation".to_string(),
                    ));
                }
                // Admin intervention on an unclaimed ticket: take it,
                // then escalate. Losing the claim race means a
                // moderator got there; fall through and escalate from
                // assigned either way.
                let _ = self.ticket_repo.claim(ticket_id, &actor.id, now).await?;
            }
            TicketStatus::Assigned => {
                if actor.role == UserRole::Moderator && ticket.assignee_id.as_deref() != Some(actor.id.as_str())
                {
                    return Err(AppError::Forbidden(
                        "Moderators may only escalate their own tickets".to_string(),
                    ));
                }
            }
        }

        if !self.ticket_repo.escalate(ticket_id, now).await? {
            // Raced with another escalation or a close.
            let current = self.ticket_repo.get_by_id(ticket_id).await?;
            return Ok(match current.status {
                TicketStatus::Closed => EscalateOutcome::AlreadyClosed,
                _ => EscalateOutcome::AlreadyEscalated,
            });
        }

        self.notify_escalated(&ticket, actor).await?;
        tracing::info!(ticket_id, actor_id = %actor.id, "Ticket escalated");
        Ok(EscalateOutcome::Escalated)
    }

    /// Close a ticket.
    ///
    /// Staff may close any ticket. A requester may close their own,
    /// except an escalated one when policy forbids it. Closing a closed
    /// ticket is a no-op that preserves the original closure audit.
    pub async fn close(
        &self,
        actor: &user::Model,
        ticket_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<CloseOutcome> {
        let ticket = self.ticket_repo.get_by_id(ticket_id).await?;

        if !actor.role.is_staff() {
            if ticket.requester_id != actor.id {
                return Err(AppError::Forbidden(
                    "Only the requester or staff may close a ticket".to_string(),
                ));
            }
            if ticket.status == TicketStatus::Escalated
                && !self.policy.requester_may_close_escalated
            {
                return Err(AppError::Forbidden(
                    "Escalated tickets are closed by staff".to_string(),
                ));
            }
        }

        if ticket.status == TicketStatus::Closed {
            return Ok(CloseOutcome::AlreadyClosed(ticket));
        }

        if !self.ticket_repo.close(ticket_id, &actor.id, now).await? {
            // Raced with another close; the first closure's audit stands.
            let current = self.ticket_repo.get_by_id(ticket_id).await?;
            return Ok(CloseOutcome::AlreadyClosed(current));
        }

        let closed = self.ticket_repo.get_by_id(ticket_id).await?;
        if closed.requester_id != actor.id {
            self.notifications
                .emit(
                    &closed.requester_id,
                    NotificationType::System,
                    "Support ticket closed",
                    &format!("Your ticket \"{}\" has been resolved and closed", closed.subject),
                    Some(format!("/support/{}", closed.id)),
                )
                .await?;
        }

        tracing::info!(ticket_id, actor_id = %actor.id, "Ticket closed");
        Ok(CloseOutcome::Closed(closed))
    }

    /// Escalate every assigned ticket idle past the staleness threshold.
    ///
    /// Runs lazily from queue reads instead of a background scheduler:
    /// the queues are correct at the moment somebody looks at them, and
    /// an idle deployment does no work. Returns the number swept.
    pub async fn sweep_stale(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::minutes(self.policy.staleness_minutes);
        let swept = self.ticket_repo.escalate_stale(cutoff).await?;
        if swept > 0 {
            tracing::info!(swept, "Stale assigned tickets escalated");
        }
        Ok(swept)
    }

    /// The moderator queue: open, unclaimed tickets, oldest first.
    ///
    /// Sweeps staleness first, so tickets abandoned by their assignee
    /// have already moved on to the admin queue by the time this list
    /// is built.
    pub async fn open_queue(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<support_ticket::Model>> {
        self.sweep_stale(now).await?;
        self.ticket_repo.list_open(limit, offset).await
    }

    /// The admin queue: escalated tickets, longest-waiting first.
    pub async fn admin_queue(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<support_ticket::Model>> {
        self.sweep_stale(now).await?;
        self.ticket_repo.list_escalated(limit, offset).await
    }

    /// A moderator's active worklist.
    ///
    /// Sweeps staleness first, like the queues: a ticket the moderator
    /// left idle past the threshold shows up here already escalated.
    pub async fn worklist(
        &self,
        assignee_id: &str,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<support_ticket::Model>> {
        self.sweep_stale(now).await?;
        self.ticket_repo.list_for_assignee(assignee_id, limit).await
    }

    /// Fetch a single ticket.
    pub async fn get(&self, ticket_id: &str) -> AppResult<support_ticket::Model> {
        self.ticket_repo.get_by_id(ticket_id).await
    }

    /// The requester's active ticket, if any.
    pub async fn active_for_requester(
        &self,
        requester_id: &str,
    ) -> AppResult<Option<support_ticket::Model>> {
        self.ticket_repo.find_active_by_requester(requester_id).await
    }

    /// Record requester or moderator activity on a ticket.
    pub async fn record_activity(&self, ticket_id: &str, now: DateTime<Utc>) -> AppResult<()> {
        self.ticket_repo.touch_activity(ticket_id, now).await
    }

    async fn notify_claimed(
        &self,
        ticket: &support_ticket::Model,
        moderator: &user::Model,
    ) -> AppResult<()> {
        let requester = self.user_repo.get_by_id(&ticket.requester_id).await?;
        self.notifications
            .emit(
                &requester.id,
                NotificationType::Message,
                "Support agent joined",
                &format!("A support agent is now handling \"{}\"", ticket.subject),
                Some(NotificationService::message_action_url(
                    &requester,
                    &moderator.id,
                )),
            )
            .await?;
        Ok(())
    }

    async fn notify_escalated(
        &self,
        ticket: &support_ticket::Model,
        actor: &user::Model,
    ) -> AppResult<()> {
        let requester = self.user_repo.get_by_id(&ticket.requester_id).await?;
        self.notifications
            .emit(
                &requester.id,
                NotificationType::System,
                "Ticket escalated",
                &format!(
                    "Your ticket \"{}\" has been escalated to senior support",
                    ticket.subject
                ),
                Some(format!("/support/{}", ticket.id)),
            )
            .await?;

        let admins = self
            .user_repo
            .list_by_role(UserRole::Admin, ADMIN_FANOUT_LIMIT)
            .await?;
        for admin in admins {
            // The escalating admin knows; skip them.
            if admin.id == actor.id {
                continue;
            }
            self.notifications
                .emit(
                    &admin.id,
                    NotificationType::System,
                    "Support ticket escalated",
                    &format!("Ticket \"{}\" needs admin attention", ticket.subject),
                    Some(format!("/admin/support/{}", ticket.id)),
                )
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use worklink_db::repositories::NotificationRepository;

    fn service(db: Arc<DatabaseConnection>) -> TicketService {
        service_with_policy(db, ModerationConfig::default())
    }

    fn service_with_policy(db: Arc<DatabaseConnection>, policy: ModerationConfig) -> TicketService {
        TicketService::new(
            TicketRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            NotificationService::new(NotificationRepository::new(db)),
            policy,
        )
    }

    fn test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            username_lower: format!("user_{id}"),
            name: None,
            role,
            token: None,
            is_banned: false,
            suspended_until: None,
            suspension_reason: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_ticket(id: &str, requester: &str, status: TicketStatus) -> support_ticket::Model {
        support_ticket::Model {
            id: id.to_string(),
            requester_id: requester.to_string(),
            subject: "Refund dispute".to_string(),
            status,
            assignee_id: match status {
                TicketStatus::Open => None,
                _ => Some("mod1".to_string()),
            },
            created_at: Utc::now().into(),
            last_activity_at: Utc::now().into(),
            closed_at: None,
            closed_by: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_subject() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let requester = test_user("u1", UserRole::Client);

        let err = service(db)
            .create(&requester, "   ", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_attaches_to_active_ticket() {
        let existing = test_ticket("t1", "u1", TicketStatus::Assigned);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );
        let requester = test_user("u1", UserRole::Client);

        let outcome = service(db)
            .create(&requester, "Still broken", Utc::now())
            .await
            .unwrap();
        assert!(matches!(outcome, TicketCreation::Attached(ref t) if t.id == "t1"));
    }

    #[tokio::test]
    async fn test_claim_rejects_non_staff() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let client = test_user("u1", UserRole::Client);

        let err = service(db)
            .claim(&client, "t1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_claim_lost_race_is_conflict() {
        // CAS matches no rows; the ticket turns out to be assigned already.
        let taken = test_ticket("t1", "u1", TicketStatus::Assigned);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[taken]])
                .into_connection(),
        );
        let moderator = test_user("mod2", UserRole::Moderator);

        let err = service(db)
            .claim(&moderator, "t1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_moderator_cannot_escalate_open_ticket() {
        let open = test_ticket("t1", "u1", TicketStatus::Open);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[open]])
                .into_connection(),
        );
        let moderator = test_user("mod1", UserRole::Moderator);

        let err = service(db)
            .escalate(&moderator, "t1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_moderator_cannot_escalate_foreign_ticket() {
        let assigned = test_ticket("t1", "u1", TicketStatus::Assigned);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[assigned]])
                .into_connection(),
        );
        let other = test_user("mod9", UserRole::Moderator);

        let err = service(db)
            .escalate(&other, "t1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_escalate_escalated_ticket_is_noop() {
        let escalated = test_ticket("t1", "u1", TicketStatus::Escalated);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[escalated]])
                .into_connection(),
        );
        let admin = test_user("a1", UserRole::Admin);

        let outcome = service(db)
            .escalate(&admin, "t1", Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome, EscalateOutcome::AlreadyEscalated);
    }

    #[tokio::test]
    async fn test_close_of_closed_ticket_preserves_audit() {
        let mut closed = test_ticket("t1", "u1", TicketStatus::Closed);
        closed.closed_at = Some(Utc::now().into());
        closed.closed_by = Some("mod1".to_string());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[closed]])
                .into_connection(),
        );
        let admin = test_user("a1", UserRole::Admin);

        match service(db).close(&admin, "t1", Utc::now()).await.unwrap() {
            CloseOutcome::AlreadyClosed(t) => {
                assert_eq!(t.closed_by.as_deref(), Some("mod1"));
                assert!(t.closed_at.is_some());
            }
            CloseOutcome::Closed(_) => panic!("second close must be a no-op"),
        }
    }

    #[tokio::test]
    async fn test_requester_cannot_close_escalated_when_policy_forbids() {
        let escalated = test_ticket("t1", "u1", TicketStatus::Escalated);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[escalated]])
                .into_connection(),
        );
        let requester = test_user("u1", UserRole::Client);

        let policy = ModerationConfig {
            requester_may_close_escalated: false,
            ..ModerationConfig::default()
        };
        let err = service_with_policy(db, policy)
            .close(&requester, "t1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_stranger_cannot_close_ticket() {
        let assigned = test_ticket("t1", "u1", TicketStatus::Assigned);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[assigned]])
                .into_connection(),
        );
        let stranger = test_user("u2", UserRole::Professional);

        let err = service(db)
            .close(&stranger, "t1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_claim_notifies_requester() {
        let claimed = test_ticket("t1", "u1", TicketStatus::Assigned);
        let requester = test_user("u1", UserRole::Client);
        let notification = worklink_db::entities::notification::Model {
            id: "n1".to_string(),
            recipient_id: "u1".to_string(),
            notification_type: worklink_db::entities::notification::NotificationType::Message,
            title: "Support agent joined".to_string(),
            body: "A support agent is now handling \"Refund dispute\"".to_string(),
            is_read: false,
            action_url: Some("/chat/mod1".to_string()),
            created_at: Utc::now().into(),
        };

        // Exec queue: the claim CAS, then the notification insert.
        // Query queue: re-fetch ticket, load requester, insert returning.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .append_query_results([[claimed]])
                .append_query_results([[requester]])
                .append_query_results([[notification]])
                .into_connection(),
        );
        let moderator = test_user("mod1", UserRole::Moderator);

        let ticket = service(db)
            .claim(&moderator, "t1", Utc::now())
            .await
            .unwrap();
        assert_eq!(ticket.status, TicketStatus::Assigned);
        assert_eq!(ticket.assignee_id.as_deref(), Some("mod1"));
    }

    #[tokio::test]
    async fn test_admin_queue_sweeps_before_listing() {
        // A ticket that went stale shows up escalated with its assignee
        // retained, because the sweep runs ahead of the list.
        let swept = test_ticket("t1", "u1", TicketStatus::Escalated);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[swept]])
                .into_connection(),
        );

        let queue = service(db)
            .admin_queue(Utc::now(), 50, 0)
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].status, TicketStatus::Escalated);
        assert_eq!(queue[0].assignee_id.as_deref(), Some("mod1"));
    }

    #[tokio::test]
    async fn test_worklist_sweeps_before_listing() {
        // The moderator's own stale ticket has been escalated by the
        // sweep by the time the worklist is built.
        let stale = test_ticket("t1", "u1", TicketStatus::Escalated);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[stale]])
                .into_connection(),
        );

        let list = service(db)
            .worklist("mod1", Utc::now(), 50)
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].status, TicketStatus::Escalated);
        assert_eq!(list[0].assignee_id.as_deref(), Some("mod1"));
    }

    #[tokio::test]
    async fn test_sweep_stale_reports_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let swept = service(db).sweep_stale(Utc::now()).await.unwrap();
        assert_eq!(swept, 2);
    }
}
