//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum NotificationType {
    #[sea_orm(string_value = "service_request")]
    ServiceRequest,
    #[sea_orm(string_value = "review")]
    Review,
    #[sea_orm(string_value = "message")]
    Message,
    #[sea_orm(string_value = "system")]
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification
    pub recipient_id: String,

    /// Notification type
    pub notification_type: NotificationType,

    /// Short headline shown in the notification list
    pub title: String,

    /// Full notification text
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Read flag. Monotonic: flips false to true and never reverts;
    /// bulk clear deletes rows instead of resetting this.
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// Where the client navigates on tap. Role-aware, fixed at creation.
    #[sea_orm(nullable)]
    pub action_url: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
