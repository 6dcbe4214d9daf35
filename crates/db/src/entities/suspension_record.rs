//! Suspension record entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only moderation log of bans and suspensions.
///
/// The access gate never reads this table; the user row is
/// authoritative. This exists so moderation actions stay auditable.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "suspension_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The suspended or banned user.
    pub user_id: String,
    /// The moderator or admin who applied it.
    pub moderator_id: String,
    /// Reason for the action.
    pub reason: String,
    /// Whether this was a permanent ban.
    pub permanent: bool,
    /// When the suspension expires (None for permanent bans).
    pub expires_at: Option<DateTimeWithTimeZone>,
    /// When the action was taken.
    pub created_at: DateTimeWithTimeZone,
    /// When the suspension was lifted early (if it was).
    pub lifted_at: Option<DateTimeWithTimeZone>,
    /// Who lifted it.
    pub lifted_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
