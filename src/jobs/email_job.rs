//! Email background job.
//!
//! Transactional emails are queued after the database work commits and
//! delivered by the `jobs work` process. Without SMTP settings the worker
//! logs each email instead of sending it.

use serde::{Deserialize, Serialize};
use std::env;

use crate::domain::{ApplicationStatus, Order, WholesaleApplication};
use crate::errors::AppError;

/// Email job payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailJob {
    /// Recipient email address
    pub to: String,
    /// Email subject line
    pub subject: String,
    /// Plain text body
    pub body: String,
    /// Optional sender override (defaults to SMTP_FROM)
    #[serde(default)]
    pub from: Option<String>,
}

impl EmailJob {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
            from: None,
        }
    }

    pub fn welcome(to: &str, name: &str, referral_code: &str) -> Self {
        Self::new(
            to,
            "Welcome to the store",
            format!(
                "Hi {},\n\nYour account is ready. Share your referral code {} \
                 and earn a commission on your friends' orders.",
                name, referral_code
            ),
        )
    }

    pub fn order_confirmation(to: &str, order: &Order) -> Self {
        Self::new(
            to,
            format!("Order {} confirmed", order.id),
            format!(
                "We received your payment of {} for order {}.\n\
                 Subtotal: {}\nDiscount: {}\nShipping: {}\nTax: {}\n\n\
                 We will let you know when it ships.",
                order.total, order.id, order.subtotal, order.discount, order.shipping, order.tax
            ),
        )
    }

    pub fn order_shipped(to: &str, order: &Order) -> Self {
        let tracking = match (&order.carrier, &order.tracking_number) {
            (Some(carrier), Some(number)) => format!("{} tracking number {}", carrier, number),
            (None, Some(number)) => format!("tracking number {}", number),
            _ => "no tracking number".to_string(),
        };
        Self::new(
            to,
            format!("Order {} has shipped", order.id),
            format!("Your order {} is on its way with {}.", order.id, tracking),
        )
    }

    pub fn wholesale_decision(to: &str, application: &WholesaleApplication) -> Self {
        let outcome = match application.status {
            ApplicationStatus::Approved => {
                "has been approved. Wholesale prices now apply to your cart."
            }
            _ => "was not approved.",
        };
        let note = application
            .review_note
            .as_deref()
            .map(|n| format!("\n\nNote from our team: {}", n))
            .unwrap_or_default();
        Self::new(
            to,
            "Your wholesale application",
            format!(
                "The wholesale application for {} {}{}",
                application.business_name, outcome, note
            ),
        )
    }
}

struct EmailConfig {
    smtp_host: Option<String>,
    smtp_from: String,
}

impl EmailConfig {
    fn from_env() -> Self {
        Self {
            smtp_host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@example.com".to_string()),
        }
    }
}

/// Email job handler - processes email sending jobs
pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    let config = EmailConfig::from_env();
    let from = job.from.as_deref().unwrap_or(&config.smtp_from);

    tracing::info!(
        to = %job.to,
        from = %from,
        subject = %job.subject,
        "Processing email job"
    );

    match config.smtp_host {
        None => {
            tracing::info!(
                "=== EMAIL (not sent) ===\nFrom: {}\nTo: {}\nSubject: {}\nBody:\n{}\n========================",
                from,
                job.to,
                job.subject,
                job.body
            );
        }
        Some(host) => {
            // TODO: deliver through an SMTP transport once a mail crate is added
            tracing::warn!(smtp_host = %host, to = %job.to, "SMTP delivery not available, email logged only");
        }
    }

    Ok(())
}
