use sea_orm_migration::{prelude::*, schema::*};

use crate::m20251018_000000_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Verification attempts with the two expiry columns used by the batch jobs.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Verification::Table)
                    .if_not_exists()
                    .col(pk_auto(Verification::Id))
                    .col(integer(Verification::UserId))
                    .col(string_len(Verification::Status, 100).default("created"))
                    .col(
                        timestamp_with_time_zone(Verification::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Verification::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(Verification::ExpiryDate))
                    .col(timestamp_with_time_zone_null(Verification::ExpiryEmailDate))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_user")
                            .from(Verification::Table, Verification::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_verification_status_user")
                    .table(Verification::Table)
                    .col(Verification::Status)
                    .col(Verification::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_verification_expiry_date")
                    .table(Verification::Table)
                    .col(Verification::ExpiryDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Verification::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Verification {
    Table,
    Id,
    UserId,
    Status,
    CreatedAt,
    UpdatedAt,
    ExpiryDate,
    ExpiryEmailDate,
}
