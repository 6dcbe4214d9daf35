//! Polling synchronization.
//!
//! There is no push channel. Clients poll, and the server owns the
//! cadence: every snapshot restates the intervals, so retuning them in
//! config reaches every client on its next tick without a redeploy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use worklink_common::{AppResult, SyncConfig};
use worklink_db::entities::{
    support_ticket::{self, TicketStatus},
    user,
};

use super::{notification::NotificationService, ticket::TicketService};

/// Compact view of the requester's active ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub last_activity_at: DateTime<Utc>,
}

impl From<support_ticket::Model> for TicketSummary {
    fn from(ticket: support_ticket::Model) -> Self {
        Self {
            id: ticket.id,
            subject: ticket.subject,
            status: ticket.status,
            last_activity_at: ticket.last_activity_at.with_timezone(&Utc),
        }
    }
}

/// One poll tick's worth of state for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSnapshot {
    /// Seconds between notification polls.
    pub notification_interval_secs: u64,
    /// Seconds between ticket polls.
    pub ticket_interval_secs: u64,
    /// Unread notification count for the badge.
    pub unread_notifications: u64,
    /// The caller's active support ticket, if any.
    pub active_ticket: Option<TicketSummary>,
}

/// Sync service.
#[derive(Clone)]
pub struct SyncService {
    notifications: NotificationService,
    tickets: TicketService,
    config: SyncConfig,
}

impl SyncService {
    /// Create a new sync service.
    #[must_use]
    pub const fn new(
        notifications: NotificationService,
        tickets: TicketService,
        config: SyncConfig,
    ) -> Self {
        Self {
            notifications,
            tickets,
            config,
        }
    }

    /// Build the poll snapshot for a user.
    ///
    /// A ticket state change is visible here within one ticket interval
    /// plus processing latency; same for notifications on their own
    /// interval.
    pub async fn snapshot(&self, user: &user::Model, _now: DateTime<Utc>) -> AppResult<SyncSnapshot> {
        let unread = self.notifications.count_unread(&user.id).await?;
        let active_ticket = self
            .tickets
            .active_for_requester(&user.id)
            .await?
            .map(TicketSummary::from);

        Ok(SyncSnapshot {
            notification_interval_secs: self.config.notification_interval_secs,
            ticket_interval_secs: self.config.ticket_interval_secs,
            unread_notifications: unread,
            active_ticket,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;
    use worklink_common::ModerationConfig;
    use worklink_db::{
        entities::user::UserRole,
        repositories::{NotificationRepository, TicketRepository, UserRepository},
    };

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        // Shape of the row sea-orm's paginator produces for COUNT(*).
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }

    fn service(db: Arc<DatabaseConnection>) -> SyncService {
        let notifications = NotificationService::new(NotificationRepository::new(db.clone()));
        let tickets = TicketService::new(
            TicketRepository::new(db.clone()),
            UserRepository::new(db.clone()),
            notifications.clone(),
            ModerationConfig::default(),
        );
        SyncService::new(notifications, tickets, SyncConfig::default())
    }

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: format!("user_{id}"),
            username_lower: format!("user_{id}"),
            name: None,
            role: UserRole::Client,
            token: None,
            is_banned: false,
            suspended_until: None,
            suspension_reason: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_ticket(id: &str, requester: &str) -> support_ticket::Model {
        support_ticket::Model {
            id: id.to_string(),
            requester_id: requester.to_string(),
            subject: "Billing question".to_string(),
            status: TicketStatus::Assigned,
            assignee_id: Some("mod1".to_string()),
            created_at: Utc::now().into(),
            last_activity_at: Utc::now().into(),
            closed_at: None,
            closed_by: None,
        }
    }

    #[tokio::test]
    async fn test_snapshot_carries_intervals_and_state() {
        // Queries in call order: unread count, then active ticket.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(4)]])
                .append_query_results([[test_ticket("t1", "u1")]])
                .into_connection(),
        );

        let user = test_user("u1");
        let snapshot = service(db).snapshot(&user, Utc::now()).await.unwrap();

        assert_eq!(snapshot.notification_interval_secs, 3);
        assert_eq!(snapshot.ticket_interval_secs, 5);
        assert_eq!(snapshot.unread_notifications, 4);
        assert_eq!(
            snapshot.active_ticket.map(|t| t.id),
            Some("t1".to_string())
        );
    }

    #[tokio::test]
    async fn test_snapshot_without_active_ticket() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(0)]])
                .append_query_results([Vec::<support_ticket::Model>::new()])
                .into_connection(),
        );

        let user = test_user("u1");
        let snapshot = service(db).snapshot(&user, Utc::now()).await.unwrap();

        assert_eq!(snapshot.unread_notifications, 0);
        assert!(snapshot.active_ticket.is_none());
    }
}
