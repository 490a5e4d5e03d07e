//! Migration: Stock levels per location and the movement ledger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(stock_levels()).await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stock_levels_location")
                    .table(StockLevels::Table)
                    .col(StockLevels::Location)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InventoryMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryMovements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InventoryMovements::VariationId).uuid().not_null())
                    .col(ColumnDef::new(InventoryMovements::FromLocation).string_len(64).null())
                    .col(ColumnDef::new(InventoryMovements::ToLocation).string_len(64).null())
                    .col(
                        ColumnDef::new(InventoryMovements::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(InventoryMovements::Quantity).gt(0)),
                    )
                    .col(ColumnDef::new(InventoryMovements::Reason).string_len(64).not_null())
                    .col(ColumnDef::new(InventoryMovements::OrderId).uuid().null())
                    .col(ColumnDef::new(InventoryMovements::ActorId).uuid().null())
                    .col(
                        ColumnDef::new(InventoryMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // Every movement has a source, a destination, or both
                    .check(
                        Expr::col(InventoryMovements::FromLocation)
                            .is_not_null()
                            .or(Expr::col(InventoryMovements::ToLocation).is_not_null()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_movements_variation")
                            .from(InventoryMovements::Table, InventoryMovements::VariationId)
                            .to(ProductVariations::Table, ProductVariations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_movements_actor")
                            .from(InventoryMovements::Table, InventoryMovements::ActorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_movements_variation")
                    .table(InventoryMovements::Table)
                    .col(InventoryMovements::VariationId)
                    .col((InventoryMovements::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StockLevels::Table).to_owned())
            .await
    }
}

/// location is 'warehouse' or 'distributor:<uuid>'
fn stock_levels() -> TableCreateStatement {
    Table::create()
        .table(StockLevels::Table)
        .if_not_exists()
        .col(ColumnDef::new(StockLevels::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(StockLevels::VariationId).uuid().not_null())
        .col(ColumnDef::new(StockLevels::Location).string_len(64).not_null())
        .col(
            ColumnDef::new(StockLevels::Quantity)
                .integer()
                .not_null()
                .default(0)
                .check(Expr::col(StockLevels::Quantity).gte(0)),
        )
        .col(
            ColumnDef::new(StockLevels::UpdatedAt)
                .timestamp_with_time_zone()
                .not_null()
                .default(Expr::current_timestamp()),
        )
        .index(
            Index::create()
                .name("uq_stock_levels_variation_location")
                .col(StockLevels::VariationId)
                .col(StockLevels::Location)
                .unique(),
        )
        .foreign_key(
            ForeignKey::create()
                .name("fk_stock_levels_variation")
                .from(StockLevels::Table, StockLevels::VariationId)
                .to(ProductVariations::Table, ProductVariations::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(Iden)]
enum StockLevels {
    Table,
    Id,
    VariationId,
    Location,
    Quantity,
    UpdatedAt,
}

#[derive(Iden)]
enum InventoryMovements {
    Table,
    Id,
    VariationId,
    FromLocation,
    ToLocation,
    Quantity,
    Reason,
    OrderId,
    ActorId,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_rows_guard_quantity_and_location() {
        let sql = stock_levels().to_string(PostgresQueryBuilder);
        assert!(sql.contains(r#"CHECK ("quantity" >= 0)"#), "{}", sql);
        assert!(sql.contains(r#""uq_stock_levels_variation_location" UNIQUE ("variation_id", "location")"#), "{}", sql);
    }
}
