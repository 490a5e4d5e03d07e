//! Migration: Wholesale applications, tasks, commissions and payment events.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WholesaleApplications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WholesaleApplications::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WholesaleApplications::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(WholesaleApplications::BusinessName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(WholesaleApplications::TaxId).string_len(64).null())
                    .col(ColumnDef::new(WholesaleApplications::Message).text().null())
                    .col(
                        ColumnDef::new(WholesaleApplications::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(WholesaleApplications::ReviewedBy).uuid().null())
                    .col(ColumnDef::new(WholesaleApplications::ReviewNote).text().null())
                    .col(
                        ColumnDef::new(WholesaleApplications::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(WholesaleApplications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wholesale_applications_user")
                            .from(WholesaleApplications::Table, WholesaleApplications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wholesale_applications_reviewer")
                            .from(WholesaleApplications::Table, WholesaleApplications::ReviewedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager.create_index(pending_application_index()).await?;

        // assignee_id NULL = admin pool
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tasks::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tasks::Kind).string_len(48).not_null())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(16)
                            .not_null()
                            .default("open"),
                    )
                    .col(ColumnDef::new(Tasks::AssigneeId).uuid().null())
                    .col(ColumnDef::new(Tasks::OrderId).uuid().null())
                    .col(ColumnDef::new(Tasks::ApplicationId).uuid().null())
                    .col(ColumnDef::new(Tasks::Title).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Tasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tasks::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Tasks::CompletedBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assignee")
                            .from(Tasks::Table, Tasks::AssigneeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_order")
                            .from(Tasks::Table, Tasks::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_application")
                            .from(Tasks::Table, Tasks::ApplicationId)
                            .to(WholesaleApplications::Table, WholesaleApplications::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_completed_by")
                            .from(Tasks::Table, Tasks::CompletedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tasks_open_assignee")
                    .table(Tasks::Table)
                    .col(Tasks::AssigneeId)
                    .and_where(Expr::col(Tasks::Status).eq("open"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tasks_order")
                    .table(Tasks::Table)
                    .col(Tasks::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Commissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Commissions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Commissions::UserId).uuid().not_null())
                    // One commission per order
                    .col(
                        ColumnDef::new(Commissions::OrderId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Commissions::Amount)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::col(Commissions::Amount).gte(0)),
                    )
                    .col(ColumnDef::new(Commissions::Rate).decimal_len(6, 4).not_null())
                    .col(
                        ColumnDef::new(Commissions::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending_payout"),
                    )
                    .col(
                        ColumnDef::new(Commissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Commissions::PaidAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commissions_user")
                            .from(Commissions::Table, Commissions::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commissions_order")
                            .from(Commissions::Table, Commissions::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commissions_user")
                    .table(Commissions::Table)
                    .col(Commissions::UserId)
                    .col(Commissions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PaymentEvents::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(PaymentEvents::EventId)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PaymentEvents::EventType).string_len(64).not_null())
                    .col(ColumnDef::new(PaymentEvents::OrderId).uuid().null())
                    .col(ColumnDef::new(PaymentEvents::Outcome).string_len(32).null())
                    .col(
                        ColumnDef::new(PaymentEvents::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PaymentEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Commissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(WholesaleApplications::Table).to_owned())
            .await
    }
}

/// At most one pending application per user
fn pending_application_index() -> IndexCreateStatement {
    Index::create()
        .name("uq_wholesale_applications_pending")
        .table(WholesaleApplications::Table)
        .col(WholesaleApplications::UserId)
        .unique()
        .and_where(Expr::col(WholesaleApplications::Status).eq("pending"))
        .to_owned()
}

#[derive(Iden)]
enum WholesaleApplications {
    Table,
    Id,
    UserId,
    BusinessName,
    TaxId,
    Message,
    Status,
    ReviewedBy,
    ReviewNote,
    ReviewedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Kind,
    Status,
    AssigneeId,
    OrderId,
    ApplicationId,
    Title,
    CreatedAt,
    CompletedAt,
    CompletedBy,
}

#[derive(Iden)]
enum Commissions {
    Table,
    Id,
    UserId,
    OrderId,
    Amount,
    Rate,
    Status,
    CreatedAt,
    PaidAt,
}

#[derive(Iden)]
enum PaymentEvents {
    Table,
    Id,
    EventId,
    EventType,
    OrderId,
    Outcome,
    ReceivedAt,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
