//! Create support ticket table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SupportTicket::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SupportTicket::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SupportTicket::RequesterId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupportTicket::Subject)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SupportTicket::Status)
                            .string_len(32)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(SupportTicket::AssigneeId).string_len(32))
                    .col(
                        ColumnDef::new(SupportTicket::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(SupportTicket::LastActivityAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SupportTicket::ClosedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(SupportTicket::ClosedBy).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_support_ticket_requester")
                            .from(SupportTicket::Table, SupportTicket::RequesterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (requester_id, status) (for a requester's ticket history)
        manager
            .create_index(
                Index::create()
                    .name("idx_support_ticket_requester_status")
                    .table(SupportTicket::Table)
                    .col(SupportTicket::RequesterId)
                    .col(SupportTicket::Status)
                    .to_owned(),
            )
            .await?;

        // One non-closed ticket per requester, held under concurrent
        // inserts. Partial indexes need raw SQL.
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_support_ticket_one_active
                ON support_ticket (requester_id)
                WHERE status != 'closed';
                ",
            )
            .await?;

        // Index: (status, last_activity_at) (for queue reads and the staleness sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_support_ticket_status_activity")
                    .table(SupportTicket::Table)
                    .col(SupportTicket::Status)
                    .col(SupportTicket::LastActivityAt)
                    .to_owned(),
            )
            .await?;

        // Index: assignee_id (for a moderator's worklist)
        manager
            .create_index(
                Index::create()
                    .name("idx_support_ticket_assignee")
                    .table(SupportTicket::Table)
                    .col(SupportTicket::AssigneeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SupportTicket::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SupportTicket {
    Table,
    Id,
    RequesterId,
    Subject,
    Status,
    AssigneeId,
    CreatedAt,
    LastActivityAt,
    ClosedAt,
    ClosedBy,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
