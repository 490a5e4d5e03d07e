//! Schema history. Applied in the order listed by `Migrator::migrations`.

use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240102_000001_add_account_fields;
mod m20240103_000001_create_catalog;
mod m20240104_000001_create_inventory;
mod m20240105_000001_create_orders;
mod m20240106_000001_create_back_office;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240102_000001_add_account_fields::Migration),
            Box::new(m20240103_000001_create_catalog::Migration),
            Box::new(m20240104_000001_create_inventory::Migration),
            Box::new(m20240105_000001_create_orders::Migration),
            Box::new(m20240106_000001_create_back_office::Migration),
        ]
    }
}
