//! Migration: Products and their variations.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Products::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Products::Description).text().null())
                    .col(ColumnDef::new(Products::Category).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Products::Price)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::col(Products::Price).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Products::WholesalePrice)
                            .decimal_len(12, 2)
                            .null()
                            .check(
                                Expr::col(Products::WholesalePrice)
                                    .is_null()
                                    .or(Expr::col(Products::WholesalePrice).gt(0)),
                            ),
                    )
                    .col(
                        ColumnDef::new(Products::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Products::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Storefront listings only ever read active products
        manager
            .create_index(
                Index::create()
                    .name("idx_products_category")
                    .table(Products::Table)
                    .col(Products::Category)
                    .and_where(Expr::col(Products::Active).eq(true))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductVariations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductVariations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ProductVariations::ProductId).uuid().not_null())
                    .col(
                        ColumnDef::new(ProductVariations::Sku)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ProductVariations::Strength).string_len(64).null())
                    .col(ColumnDef::new(ProductVariations::Flavor).string_len(64).null())
                    .col(
                        ColumnDef::new(ProductVariations::PriceOverride)
                            .decimal_len(12, 2)
                            .null()
                            .check(
                                Expr::col(ProductVariations::PriceOverride)
                                    .is_null()
                                    .or(Expr::col(ProductVariations::PriceOverride).gt(0)),
                            ),
                    )
                    .col(
                        ColumnDef::new(ProductVariations::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ProductVariations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProductVariations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_variations_product")
                            .from(ProductVariations::Table, ProductVariations::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_variations_product")
                    .table(ProductVariations::Table)
                    .col(ProductVariations::ProductId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProductVariations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
    Name,
    Description,
    Category,
    Price,
    WholesalePrice,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ProductVariations {
    Table,
    Id,
    ProductId,
    Sku,
    Strength,
    Flavor,
    PriceOverride,
    Active,
    CreatedAt,
    UpdatedAt,
}
