//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Marketplace roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum UserRole {
    #[sea_orm(string_value = "client")]
    Client,
    #[sea_orm(string_value = "professional")]
    Professional,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// Whether this role belongs to the moderation layer.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    pub username_lower: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    /// Marketplace role
    pub role: UserRole,

    /// Session bearer token
    #[sea_orm(unique, nullable)]
    pub token: Option<String>,

    /// Permanent ban flag. Independent of `suspended_until`: a banned
    /// user may also carry a stale suspension timestamp. Ban dominates.
    #[sea_orm(default_value = false)]
    pub is_banned: bool,

    /// Temporary suspension expiry. Expiry is computed on read, never
    /// cleared by a background job.
    #[sea_orm(nullable)]
    pub suspended_until: Option<DateTimeWithTimeZone>,

    /// Why the current suspension or ban was applied.
    #[sea_orm(nullable)]
    pub suspension_reason: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::support_ticket::Entity")]
    Tickets,

    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::support_ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
