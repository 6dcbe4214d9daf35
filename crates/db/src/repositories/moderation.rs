//! Moderation repository for suspension state and the moderation log.
//!
//! Suspension state lives on the user row (that is what the access gate
//! reads); every apply and lift also appends to the `suspension_record`
//! log. User-row writes are filtered `update_many` statements so two
//! concurrent moderation actions cannot interleave a read-then-write.

use std::sync::Arc;

use crate::entities::{SuspensionRecord, User, suspension_record, user};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use worklink_common::{AppError, AppResult};

/// Moderation repository for database operations.
#[derive(Clone)]
pub struct ModerationRepository {
    db: Arc<DatabaseConnection>,
}

impl ModerationRepository {
    /// Create a new moderation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ========== User suspension state ==========

    /// Set a temporary suspension on the user row.
    pub async fn suspend_user(
        &self,
        user_id: &str,
        until: DateTime<Utc>,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = User::update_many()
            .filter(user::Column::Id.eq(user_id))
            .col_expr(
                user::Column::SuspendedUntil,
                Expr::value(DateTimeWithTimeZone::from(until)),
            )
            .col_expr(user::Column::SuspensionReason, reason.to_string().into())
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    /// Set the permanent ban flag on the user row.
    ///
    /// Any `suspended_until` already present is left in place; the gate
    /// makes the ban dominate.
    pub async fn ban_user(&self, user_id: &str, reason: &str, now: DateTime<Utc>) -> AppResult<()> {
        let result = User::update_many()
            .filter(user::Column::Id.eq(user_id))
            .col_expr(user::Column::IsBanned, true.into())
            .col_expr(user::Column::SuspensionReason, reason.to_string().into())
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    /// Clear a temporary suspension early.
    ///
    /// Returns `true` if a live suspension was actually cleared; a user
    /// with no `suspended_until` set matches no rows.
    pub async fn lift_suspension(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let result = User::update_many()
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::SuspendedUntil.is_not_null())
            .col_expr(
                user::Column::SuspendedUntil,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .col_expr(
                user::Column::SuspensionReason,
                Expr::value(Option::<String>::None),
            )
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// List users currently blocked (banned, or suspended past `now`).
    pub async fn list_blocked_users(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(
                user::Column::IsBanned
                    .eq(true)
                    .or(user::Column::SuspendedUntil.gt(DateTimeWithTimeZone::from(now))),
            )
            .order_by_desc(user::Column::UpdatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ========== Moderation log ==========

    /// Append a suspension record.
    pub async fn create_record(
        &self,
        model: suspension_record::ActiveModel,
    ) -> AppResult<suspension_record::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark the latest unlifted record for a user as lifted.
    pub async fn mark_record_lifted(
        &self,
        user_id: &str,
        lifted_by: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        SuspensionRecord::update_many()
            .filter(suspension_record::Column::UserId.eq(user_id))
            .filter(suspension_record::Column::Permanent.eq(false))
            .filter(suspension_record::Column::LiftedAt.is_null())
            .col_expr(
                suspension_record::Column::LiftedAt,
                Expr::value(DateTimeWithTimeZone::from(now)),
            )
            .col_expr(
                suspension_record::Column::LiftedBy,
                lifted_by.to_string().into(),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the moderation history for a user, newest first.
    pub async fn records_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<suspension_record::Model>> {
        SuspensionRecord::find()
            .filter(suspension_record::Column::UserId.eq(user_id))
            .order_by_desc(suspension_record::Column::CreatedAt)
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

    #[tokio::test]
    async fn test_suspend_missing_user_errors() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ModerationRepository::new(db);
        let now = Utc::now();
        let err = repo
            .suspend_user("ghost", now + chrono::Duration::days(7), "spam", now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn test_lift_without_suspension_is_noop() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ModerationRepository::new(db);
        let lifted = repo.lift_suspension("u1", Utc::now()).await.unwrap();
        assert!(!lifted);
    }
}
