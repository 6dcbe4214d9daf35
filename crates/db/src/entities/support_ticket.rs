//! Support ticket entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Support ticket lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[derive(Default)]
pub enum TicketStatus {
    #[sea_orm(string_value = "open")]
    #[default]
    Open,
    #[sea_orm(string_value = "assigned")]
    Assigned,
    #[sea_orm(string_value = "escalated")]
    Escalated,
    #[sea_orm(string_value = "closed")]
    Closed,
}

impl TicketStatus {
    /// Whether the ticket still counts against the one-active-ticket rule.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Support ticket model.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "support_ticket")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user who asked for help.
    pub requester_id: String,

    /// What the ticket is about.
    pub subject: String,

    /// Current lifecycle status.
    pub status: TicketStatus,

    /// The moderator who claimed the ticket. Set iff status is
    /// assigned or escalated; retained as provenance after escalation.
    #[sea_orm(nullable)]
    pub assignee_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,

    /// Last requester or moderator action; drives lazy staleness escalation.
    pub last_activity_at: DateTimeWithTimeZone,

    /// When the ticket was closed. Closed tickets are kept for audit.
    #[sea_orm(nullable)]
    pub closed_at: Option<DateTimeWithTimeZone>,

    /// Who closed the ticket (requester, moderator, or admin).
    #[sea_orm(nullable)]
    pub closed_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RequesterId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Requester,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requester.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
