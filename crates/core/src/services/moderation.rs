//! Moderation actions: bans, suspensions, and their audit trail.
//!
//! State the gate reads lives on the user row; every apply and lift
//! also appends to the suspension log. The two writes are not wrapped
//! in a transaction: the user-row write goes first, so a crash between
//! them leaves the block enforced with a missing log line rather than
//! a logged block that is not enforced.

use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::Set;
use worklink_common::{AppError, AppResult, IdGenerator, ModerationConfig};
use worklink_db::{
    entities::{
        notification::NotificationType,
        suspension_record,
        user::{self, UserRole},
    },
    repositories::{ModerationRepository, UserRepository},
};

use super::notification::NotificationService;

/// A moderation action to apply to an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuspensionAction {
    /// Permanent ban.
    Permanent { reason: String },
    /// Time-boxed suspension.
    Temporary { days: i64, reason: String },
}

impl SuspensionAction {
    fn reason(&self) -> &str {
        match self {
            Self::Permanent { reason } | Self::Temporary { reason, .. } => reason,
        }
    }
}

/// Moderation service.
#[derive(Clone)]
pub struct ModerationService {
    moderation_repo: ModerationRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
    policy: ModerationConfig,
    id_gen: IdGenerator,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        moderation_repo: ModerationRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
        policy: ModerationConfig,
    ) -> Self {
        Self {
            moderation_repo,
            user_repo,
            notifications,
            policy,
            id_gen: IdGenerator::new(),
        }
    }

    /// Apply a ban or suspension to a target account.
    ///
    /// Moderators may act on clients and professionals; only admins may
    /// act on moderators; admins are never valid targets. The new state
    /// overwrites any previous suspension on the user row, and the log
    /// gains a record either way.
    pub async fn apply(
        &self,
        actor: &user::Model,
        target_id: &str,
        action: SuspensionAction,
        now: DateTime<Utc>,
    ) -> AppResult<suspension_record::Model> {
        self.check_authority(actor, target_id).await?;

        let reason = action.reason().trim().to_string();
        if reason.is_empty() {
            return Err(AppError::Validation("Reason must not be empty".to_string()));
        }

        let (permanent, expires_at) = match action {
            SuspensionAction::Permanent { .. } => {
                self.moderation_repo.ban_user(target_id, &reason, now).await?;
                (true, None)
            }
            SuspensionAction::Temporary { days, .. } => {
                if days < 1 || days > self.policy.max_suspension_days {
                    return Err(AppError::Validation(format!(
                        "Suspension must be between 1 and {} days",
                        self.policy.max_suspension_days
                    )));
                }
                let until = now + Duration::days(days);
                self.moderation_repo
                    .suspend_user(target_id, until, &reason, now)
                    .await?;
                (false, Some(until))
            }
        };

        let record = self
            .moderation_repo
            .create_record(suspension_record::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(target_id.to_string()),
                moderator_id: Set(actor.id.clone()),
                reason: Set(reason.clone()),
                permanent: Set(permanent),
                expires_at: Set(expires_at.map(Into::into)),
                created_at: Set(now.into()),
                lifted_at: Set(None),
                lifted_by: Set(None),
            })
            .await?;

        // The target sees this on the block screen's next poll.
        let (title, body) = if permanent {
            (
                "Account banned",
                format!("Your account has been permanently banned: {reason}"),
            )
        } else {
            (
                "Account suspended",
                format!("Your account has been temporarily suspended: {reason}"),
            )
        };
        self.notifications
            .emit(target_id, NotificationType::System, title, &body, None)
            .await?;

        tracing::info!(
            target_id,
            actor_id = %actor.id,
            permanent,
            "Moderation action applied"
        );
        Ok(record)
    }

    /// Lift a temporary suspension early.
    ///
    /// Returns `true` if a live suspension was cleared. Bans are not
    /// liftable through this path; lifting a user with no suspension is
    /// a no-op.
    pub async fn lift(
        &self,
        actor: &user::Model,
        target_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.check_authority(actor, target_id).await?;

        let lifted = self.moderation_repo.lift_suspension(target_id, now).await?;
        if lifted {
            self.moderation_repo
                .mark_record_lifted(target_id, &actor.id, now)
                .await?;
            self.notifications
                .emit(
                    target_id,
                    NotificationType::System,
                    "Suspension lifted",
                    "Your account suspension has been lifted early",
                    None,
                )
                .await?;
            tracing::info!(target_id, actor_id = %actor.id, "Suspension lifted");
        }
        Ok(lifted)
    }

    /// List accounts currently blocked by the gate.
    pub async fn list_blocked(
        &self,
        now: DateTime<Utc>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        self.moderation_repo.list_blocked_users(now, limit, offset).await
    }

    /// Moderation history for an account, newest first.
    pub async fn history(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<suspension_record::Model>> {
        self.moderation_repo.records_for_user(user_id, limit).await
    }

    /// Authority check shared by apply and lift.
    async fn check_authority(&self, actor: &user::Model, target_id: &str) -> AppResult<()> {
        if !actor.role.is_staff() {
            return Err(AppError::Forbidden(
                "Only moderation staff may take moderation actions".to_string(),
            ));
        }
        if actor.id == target_id {
            return Err(AppError::BadRequest(
                "Cannot moderate your own account".to_string(),
            ));
        }

        let target = self.user_repo.get_by_id(target_id).await?;
        match target.role {
            UserRole::Admin => Err(AppError::Forbidden(
                "Admin accounts cannot be moderated".to_string(),
            )),
            UserRole::Moderator if actor.role != UserRole::Admin => Err(AppError::Forbidden(
                "Only admins may moderate moderators".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
