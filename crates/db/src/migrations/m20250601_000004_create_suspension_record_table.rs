//! Create suspension record table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SuspensionRecord::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SuspensionRecord::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SuspensionRecord::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SuspensionRecord::ModeratorId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SuspensionRecord::Reason)
                            .string_len(2000)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SuspensionRecord::Permanent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(SuspensionRecord::ExpiresAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(SuspensionRecord::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(SuspensionRecord::LiftedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(SuspensionRecord::LiftedBy).string_len(32))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_suspension_record_user")
                            .from(SuspensionRecord::Table, SuspensionRecord::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for a user's moderation history)
        manager
            .create_index(
                Index::create()
                    .name("idx_suspension_record_user_id")
                    .table(SuspensionRecord::Table)
                    .col(SuspensionRecord::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SuspensionRecord::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum SuspensionRecord {
    Table,
    Id,
    UserId,
    ModeratorId,
    Reason,
    Permanent,
    ExpiresAt,
    CreatedAt,
    LiftedAt,
    LiftedBy,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
