//! Background jobs processed by the `jobs work` worker.

mod email_job;
mod notifier;

pub use email_job::{email_job_handler, EmailJob};
pub use notifier::{notify, JobQueueNotifier, LogNotifier, Notifier};

#[cfg(any(test, feature = "test-utils"))]
pub use notifier::MockNotifier;
