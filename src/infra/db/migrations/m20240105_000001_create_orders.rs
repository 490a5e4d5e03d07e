//! Migration: Carts, discount codes, orders, order lines and status history.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CartItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(CartItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(CartItems::UserId).uuid().not_null())
                    .col(ColumnDef::new(CartItems::VariationId).uuid().not_null())
                    .col(
                        ColumnDef::new(CartItems::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(CartItems::Quantity).gt(0)),
                    )
                    .col(timestamp(CartItems::CreatedAt))
                    .col(timestamp(CartItems::UpdatedAt))
                    .index(
                        Index::create()
                            .name("uq_cart_items_user_variation")
                            .col(CartItems::UserId)
                            .col(CartItems::VariationId)
                            .unique(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_user")
                            .from(CartItems::Table, CartItems::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_items_variation")
                            .from(CartItems::Table, CartItems::VariationId)
                            .to(ProductVariations::Table, ProductVariations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DiscountCodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DiscountCodes::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(DiscountCodes::Code)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::Kind)
                            .string_len(16)
                            .not_null()
                            .check(Expr::col(DiscountCodes::Kind).is_in(["percentage", "fixed"])),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::Value)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::col(DiscountCodes::Value).gt(0)),
                    )
                    .col(ColumnDef::new(DiscountCodes::MinSubtotal).decimal_len(12, 2).null())
                    .col(
                        ColumnDef::new(DiscountCodes::MaxUses)
                            .integer()
                            .null()
                            .check(
                                Expr::col(DiscountCodes::MaxUses)
                                    .is_null()
                                    .or(Expr::col(DiscountCodes::MaxUses).gt(0)),
                            ),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::UsedCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(DiscountCodes::UsedCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::StartsAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DiscountCodes::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(timestamp(DiscountCodes::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                    .col(ColumnDef::new(Orders::Status).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string_len(16)
                            .not_null()
                            .default("unpaid"),
                    )
                    .col(money(Orders::Subtotal))
                    .col(money(Orders::Discount).default(0))
                    .col(money(Orders::Shipping).default(0))
                    .col(money(Orders::Tax).default(0))
                    .col(money(Orders::Total))
                    .col(ColumnDef::new(Orders::DiscountCode).string_len(64).null())
                    .col(ColumnDef::new(Orders::ShippingAddress).text().not_null())
                    .col(ColumnDef::new(Orders::Notes).text().null())
                    .col(ColumnDef::new(Orders::DistributorId).uuid().null())
                    .col(ColumnDef::new(Orders::PaymentId).string_len(255).null())
                    .col(
                        ColumnDef::new(Orders::PaidAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Orders::TrackingNumber).string_len(128).null())
                    .col(ColumnDef::new(Orders::Carrier).string_len(64).null())
                    .col(ColumnDef::new(Orders::FulfillmentProofUrl).text().null())
                    .col(ColumnDef::new(Orders::FulfillmentNotes).text().null())
                    .col(timestamp(Orders::CreatedAt))
                    .col(timestamp(Orders::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_user")
                            .from(Orders::Table, Orders::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_distributor")
                            .from(Orders::Table, Orders::DistributorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .col((Orders::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_distributor")
                    .table(Orders::Table)
                    .col(Orders::DistributorId)
                    .and_where(Expr::col(Orders::DistributorId).is_not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrderItems::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::VariationId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::ProductName).string_len(255).not_null())
                    .col(ColumnDef::new(OrderItems::Sku).string_len(64).not_null())
                    .col(
                        ColumnDef::new(OrderItems::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(OrderItems::Quantity).gt(0)),
                    )
                    .col(money(OrderItems::UnitPrice))
                    .col(money(OrderItems::LineTotal))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_variation")
                            .from(OrderItems::Table, OrderItems::VariationId)
                            .to(ProductVariations::Table, ProductVariations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderStatusHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderStatusHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderStatusHistory::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderStatusHistory::FromStatus).string_len(32).null())
                    .col(ColumnDef::new(OrderStatusHistory::ToStatus).string_len(32).not_null())
                    .col(ColumnDef::new(OrderStatusHistory::ActorId).uuid().null())
                    .col(ColumnDef::new(OrderStatusHistory::Note).text().null())
                    .col(timestamp(OrderStatusHistory::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_status_history_order")
                            .from(OrderStatusHistory::Table, OrderStatusHistory::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_status_history_actor")
                            .from(OrderStatusHistory::Table, OrderStatusHistory::ActorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_status_history_order")
                    .table(OrderStatusHistory::Table)
                    .col(OrderStatusHistory::OrderId)
                    .col(OrderStatusHistory::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderStatusHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DiscountCodes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CartItems::Table).to_owned())
            .await
    }
}

/// NUMERIC(12, 2) NOT NULL
fn money<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column).decimal_len(12, 2).not_null().to_owned()
}

fn timestamp<T: IntoIden>(column: T) -> ColumnDef {
    ColumnDef::new(column)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum CartItems {
    Table,
    Id,
    UserId,
    VariationId,
    Quantity,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum DiscountCodes {
    Table,
    Id,
    Code,
    Kind,
    Value,
    MinSubtotal,
    MaxUses,
    UsedCount,
    Active,
    StartsAt,
    ExpiresAt,
    CreatedAt,
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    UserId,
    Status,
    PaymentStatus,
    Subtotal,
    Discount,
    Shipping,
    Tax,
    Total,
    DiscountCode,
    ShippingAddress,
    Notes,
    DistributorId,
    PaymentId,
    PaidAt,
    TrackingNumber,
    Carrier,
    FulfillmentProofUrl,
    FulfillmentNotes,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    VariationId,
    ProductName,
    Sku,
    Quantity,
    UnitPrice,
    LineTotal,
}

#[derive(Iden)]
enum OrderStatusHistory {
    Table,
    Id,
    OrderId,
    FromStatus,
    ToStatus,
    ActorId,
    Note,
    CreatedAt,
}

#[derive(Iden)]
enum ProductVariations {
    Table,
    Id,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
