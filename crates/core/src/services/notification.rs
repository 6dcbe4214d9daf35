//! Notification delivery.
//!
//! Delivery is a synchronous insert in the same transaction scope as the
//! event that caused it; polling clients pick the row up on their next
//! tick. There is no push channel and no retry queue, so an insert
//! failure fails the triggering mutation instead of being silently lost.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use worklink_common::{AppResult, IdGenerator};
use worklink_db::{
    entities::{
        notification::{self, NotificationType},
        user::{self, UserRole},
    },
    repositories::NotificationRepository,
};

/// Notification service.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append a notification for a recipient.
    pub async fn emit(
        &self,
        recipient_id: &str,
        notification_type: NotificationType,
        title: &str,
        body: &str,
        action_url: Option<String>,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            recipient_id: Set(recipient_id.to_string()),
            notification_type: Set(notification_type),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            is_read: Set(false),
            action_url: Set(action_url),
            created_at: Set(Utc::now().into()),
        };

        let created = self.notification_repo.create(model).await?;
        tracing::debug!(
            recipient_id,
            notification_id = %created.id,
            kind = ?notification_type,
            "Notification emitted"
        );
        Ok(created)
    }

    /// Build the conversation URL for a message-type notification.
    ///
    /// The destination depends on the recipient's role, not the
    /// sender's: professionals land in their dashboard inbox, everyone
    /// else in the plain chat view. Fixed at creation time.
    #[must_use]
    pub fn message_action_url(recipient: &user::Model, peer_id: &str) -> String {
        if recipient.role == UserRole::Professional {
            format!("/dashboard/messages/{peer_id}")
        } else {
            format!("/chat/{peer_id}")
        }
    }

    /// List notifications for a recipient, newest first.
    pub async fn list(
        &self,
        recipient_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_recipient(recipient_id, limit, until_id)
            .await
    }

    /// List notifications and mark the recipient's backlog read.
    ///
    /// The snapshot is taken before the flip so the response still
    /// carries the unread flags the client needs to highlight new
    /// entries. Opening the list implies reading it.
    pub async fn list_and_mark_read(
        &self,
        recipient_id: &str,
        limit: u64,
        until_id: Option<&str>,
    ) -> AppResult<Vec<notification::Model>> {
        let snapshot = self
            .notification_repo
            .find_by_recipient(recipient_id, limit, until_id)
            .await?;

        self.notification_repo.mark_all_read(recipient_id).await?;

        Ok(snapshot)
    }

    /// Mark a single notification as read. Idempotent.
    pub async fn mark_read(&self, recipient_id: &str, id: &str) -> AppResult<()> {
        self.notification_repo.mark_read(recipient_id, id).await
    }

    /// Mark every notification for a recipient as read. Idempotent.
    pub async fn mark_all_read(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_read(recipient_id).await
    }

    /// Count unread notifications for a recipient.
    pub async fn count_unread(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(recipient_id).await
    }

    /// Delete all of a recipient's notifications.
    pub async fn clear_all(&self, recipient_id: &str) -> AppResult<u64> {
        self.notification_repo.clear_all(recipient_id).await
    }
}
