//! Migrate command - applies, rolls back or inspects the storefront schema.

use sea_orm_migration::MigratorTrait;

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Migrator};

pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    let db = Database::open(&config, false)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let conn = db.get_connection();

    match args.action {
        MigrateAction::Up => {
            Migrator::up(&conn, None).await?;
            tracing::info!("Schema is up to date");
        }
        MigrateAction::Down { steps } => {
            tracing::info!(steps, "Rolling back migrations");
            Migrator::down(&conn, Some(steps)).await?;
        }
        MigrateAction::Status => {
            let states = db.schema_status().await?;
            let pending = states.iter().filter(|s| !s.applied).count();
            for state in &states {
                println!(
                    "{:<8} {}",
                    if state.applied { "applied" } else { "pending" },
                    state.name
                );
            }
            println!("{} migrations, {} pending", states.len(), pending);
        }
        MigrateAction::Fresh { yes } => {
            if !yes {
                return Err(AppError::bad_request(
                    "`migrate fresh` drops every table; pass --yes to confirm",
                ));
            }
            tracing::warn!("Dropping all tables and rebuilding the schema");
            Migrator::fresh(&conn).await?;
        }
    }

    Ok(())
}
