//! Outbound notifications.
//!
//! Services hand emails to a [`Notifier`] once their transaction has
//! committed. Delivery failures are logged and never undo the business
//! operation.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use async_trait::async_trait;

use super::EmailJob;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, job: EmailJob) -> AppResult<()>;
}

/// Queues emails in the apalis Postgres storage for the job worker.
pub struct JobQueueNotifier {
    storage: PostgresStorage<EmailJob>,
}

impl JobQueueNotifier {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl Notifier for JobQueueNotifier {
    async fn send(&self, job: EmailJob) -> AppResult<()> {
        let mut storage = self.storage.clone();
        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to queue email: {}", e)))?;
        Ok(())
    }
}

/// Writes emails to the log. Used when the job queue is unavailable.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, job: EmailJob) -> AppResult<()> {
        tracing::info!(to = %job.to, subject = %job.subject, "Email not queued (log only)");
        Ok(())
    }
}

/// Send and swallow the error, logging it.
pub async fn notify(notifier: &dyn Notifier, job: EmailJob) {
    let to = job.to.clone();
    if let Err(e) = notifier.send(job).await {
        tracing::warn!(to = %to, error = %e, "Email notification failed");
    }
}
