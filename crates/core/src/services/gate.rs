//! Access gate: the authorization check that blocks banned and
//! suspended accounts on every privileged request.
//!
//! Expiry is computed, not event-driven: nothing ever clears an elapsed
//! `suspended_until`, so every evaluation recomputes against the clock
//! and a just-expired suspension flips to allowed on the very next call.

use chrono::{DateTime, Utc};
use worklink_db::{entities::user, repositories::UserRepository};
use worklink_common::{AppError, AppResult, BlockKind};

/// Outcome of an access gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// The account may proceed.
    Allowed,
    /// The account is blocked; carries what the client needs to render
    /// the full-screen notice and countdown.
    Blocked {
        /// Permanent ban or temporary suspension.
        kind: BlockKind,
        /// Authoritative expiry for temporary blocks.
        until: Option<DateTime<Utc>>,
        /// Why the block was applied.
        reason: Option<String>,
    },
}

impl AccessDecision {
    /// Whether the decision permits access.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Evaluate the gate for a user at a given instant.
///
/// Pure function of user state and clock. A permanent ban dominates any
/// suspension timestamp, live or stale.
#[must_use]
pub fn evaluate(user: &user::Model, now: DateTime<Utc>) -> AccessDecision {
    if user.is_banned {
        return AccessDecision::Blocked {
            kind: BlockKind::Permanent,
            until: None,
            reason: user.suspension_reason.clone(),
        };
    }

    if let Some(until) = user.suspended_until {
        let until: DateTime<Utc> = until.with_timezone(&Utc);
        if until > now {
            return AccessDecision::Blocked {
                kind: BlockKind::Temporary,
                until: Some(until),
                reason: user.suspension_reason.clone(),
            };
        }
    }

    AccessDecision::Allowed
}

/// Evaluate the gate and convert a block into an error.
///
/// This is what privileged request paths call: an allowed user passes
/// through, a blocked one gets the structured `Blocked` error that
/// renders as the full-screen notice.
pub fn require_allowed(user: &user::Model, now: DateTime<Utc>) -> AppResult<()> {
    match evaluate(user, now) {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::Blocked {
            kind,
            until,
            reason,
        } => Err(AppError::Blocked {
            kind,
            until,
            reason,
        }),
    }
}

/// Gate service wrapping the pure evaluation with user lookup.
#[derive(Clone)]
pub struct GateService {
    user_repo: UserRepository,
}

impl GateService {
    /// Create a new gate service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Evaluate the gate for a user ID.
    ///
    /// Fail-closed: if the user's state cannot be determined the
    /// request is denied, never waved through.
    pub async fn evaluate_user(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<AccessDecision> {
        let user = match self.user_repo.get_by_id(user_id).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, user_id, "Gate could not load user state; denying");
                return Err(AppError::Forbidden(
                    "Account state unavailable".to_string(),
                ));
            }
        };

        Ok(evaluate(&user, now))
    }
}
