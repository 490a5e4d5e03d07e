//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{BlobStorage, Cache, Database, HttpBlobStorage};
use crate::jobs::{EmailJob, JobQueueNotifier, LogNotifier, Notifier};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    let db = Database::open(&config, true)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let cache = Cache::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Redis connection failed: {}", e)))?;

    let notifier = email_notifier(&config).await;
    let storage = HttpBlobStorage::from_config(&config)
        .map(|storage| Arc::new(storage) as Arc<dyn BlobStorage>);
    if storage.is_none() {
        tracing::warn!("BLOB_STORAGE_URL not set; uploads are disabled");
    }

    let addr = config.server_addr();
    let app_state = AppState::from_config(Arc::new(db), Arc::new(cache), config, notifier, storage);
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    // Peer addresses feed the rate limiter when no proxy header is present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Queue emails for the worker, or only log them if the queue cannot be set up.
async fn email_notifier(config: &Config) -> Arc<dyn Notifier> {
    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Job queue unavailable; emails will only be logged");
            return Arc::new(LogNotifier);
        }
    };

    if let Err(e) = PostgresStorage::setup(&pool).await {
        tracing::warn!(error = %e, "Job storage setup failed; emails will only be logged");
        return Arc::new(LogNotifier);
    }

    let storage: PostgresStorage<EmailJob> = PostgresStorage::new(pool);
    Arc::new(JobQueueNotifier::new(storage))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            // Keep serving; the process can still be killed
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
