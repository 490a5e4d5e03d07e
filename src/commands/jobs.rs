//! Jobs command - the email worker and queue maintenance.
//!
//! ```bash
//! storefront jobs work    # deliver queued emails
//! storefront jobs list    # counts per job status
//! storefront jobs clear   # drop failed jobs
//! ```

use sea_orm::{ConnectionTrait, Database as SeaDatabase, DatabaseBackend, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_NAME_EMAIL};
use crate::errors::{AppError, AppResult};

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Process queued emails until Ctrl+C.
async fn run_worker(config: &Config) -> AppResult<()> {
    use apalis::prelude::*;
    use apalis_sql::postgres::PostgresStorage;
    use apalis_sql::sqlx::postgres::PgPoolOptions;

    use crate::jobs::{email_job_handler, EmailJob};

    tracing::info!("Connecting to database for job worker...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    let email_storage: PostgresStorage<EmailJob> = PostgresStorage::new(pool);

    tracing::info!(job = JOB_NAME_EMAIL, "Job worker started. Press Ctrl+C to stop.");

    let worker = WorkerBuilder::new(JOB_NAME_EMAIL)
        .backend(email_storage)
        .build_fn(email_job_handler);

    let monitor = Monitor::new().register(worker);

    tokio::select! {
        result = monitor.run() => {
            if let Err(e) = result {
                tracing::error!("Worker error: {}", e);
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping worker...");
        }
    }

    tracing::info!("Job worker stopped.");
    Ok(())
}

/// Print job counts per status from the apalis tables.
async fn list_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;
    if !queue_initialized(&db).await? {
        println!("Job queue not initialized. Run 'jobs work' first to create the queue tables.");
        return Ok(());
    }

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count FROM apalis.jobs GROUP BY status",
        ))
        .await
        .map_err(|e| AppError::internal(format!("Query failed: {}", e)))?;

    let mut counts = [("Pending", 0i64), ("Running", 0), ("Failed", 0), ("Done", 0)];
    for row in rows {
        let (Ok(status), Ok(count)) = (
            row.try_get::<String>("", "status"),
            row.try_get::<i64>("", "count"),
        ) else {
            continue;
        };
        if let Some(slot) = counts.iter_mut().find(|(name, _)| *name == status) {
            slot.1 = count;
        }
    }

    println!("\n=== {} queue ===", JOB_NAME_EMAIL);
    for (status, count) in counts {
        println!("{:<9} {}", format!("{}:", status), count);
    }
    println!();
    Ok(())
}

/// Delete failed jobs from the queue
async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;
    if !queue_initialized(&db).await? {
        println!("Job queue not initialized. Nothing to clear.");
        return Ok(());
    }

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await
        .map_err(|e| AppError::internal(format!("Failed to clear jobs: {}", e)))?;

    println!("Cleared {} failed job(s) from the queue.", result.rows_affected());
    Ok(())
}

async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    tracing::info!("Connecting to database...");
    SeaDatabase::connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))
}

/// The apalis schema only exists after a worker has run `setup`.
async fn queue_initialized(db: &DatabaseConnection) -> AppResult<bool> {
    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await
        .map_err(|e| AppError::internal(format!("Query failed: {}", e)))?;

    Ok(row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false))
}
