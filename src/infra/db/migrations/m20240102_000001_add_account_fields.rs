//! Migration: Account status, referrals and soft delete on users.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .add_column(
                        ColumnDef::new(Users::Status)
                            .string_len(32)
                            .not_null()
                            .default("active"),
                    )
                    .add_column(ColumnDef::new(Users::ReferralCode).string_len(16).null())
                    .add_column(ColumnDef::new(Users::ReferredBy).uuid().null())
                    .add_column(
                        ColumnDef::new(Users::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Existing rows get a deterministic code before the column becomes required
        manager
            .get_connection()
            .execute_unprepared(
                "UPDATE users SET referral_code = UPPER(SUBSTRING(REPLACE(id::text, '-', '') FROM 1 FOR 8)) \
                 WHERE referral_code IS NULL",
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .modify_column(ColumnDef::new(Users::ReferralCode).string_len(16).not_null())
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_users_referred_by")
                            .from_tbl(Users::Table)
                            .from_col(Users::ReferredBy)
                            .to_tbl(Users::Table)
                            .to_col(Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_referral_code")
                    .table(Users::Table)
                    .col(Users::ReferralCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_referred_by")
                    .table(Users::Table)
                    .col(Users::ReferredBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_deleted_at")
                    .table(Users::Table)
                    .col(Users::DeletedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for index in [
            "idx_users_deleted_at",
            "idx_users_referred_by",
            "idx_users_referral_code",
        ] {
            manager
                .drop_index(Index::drop().name(index).table(Users::Table).to_owned())
                .await?;
        }

        manager
            .alter_table(
                Table::alter()
                    .table(Users::Table)
                    .drop_foreign_key(Alias::new("fk_users_referred_by"))
                    .drop_column(Users::DeletedAt)
                    .drop_column(Users::ReferredBy)
                    .drop_column(Users::ReferralCode)
                    .drop_column(Users::Status)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Status,
    ReferralCode,
    ReferredBy,
    DeletedAt,
}
