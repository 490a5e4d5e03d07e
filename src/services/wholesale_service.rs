//! Wholesale account applications.
//!
//! Approval upgrades the applicant to `wholesale` in the same transaction
//! that records the decision, so the role and the application never
//! disagree.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{ApplicationStatus, NewTask, UserRole, WholesaleApplication};
use crate::errors::{AppError, AppResult};
use crate::infra::{CacheInvalidator, UnitOfWork};
use crate::jobs::{notify, EmailJob, Notifier};
use crate::types::{Paginated, PaginationParams};

/// Application form
#[derive(Debug, Clone)]
pub struct ApplicationForm {
    pub business_name: String,
    pub tax_id: Option<String>,
    pub message: Option<String>,
}

#[async_trait]
pub trait WholesaleService: Send + Sync {
    async fn apply(
        &self,
        user_id: Uuid,
        role: UserRole,
        form: ApplicationForm,
    ) -> AppResult<WholesaleApplication>;

    /// The caller's most recent application
    async fn my_latest(&self, user_id: Uuid) -> AppResult<WholesaleApplication>;

    async fn list(
        &self,
        status: Option<ApplicationStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<WholesaleApplication>>;

    async fn approve(
        &self,
        reviewer_id: Uuid,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<WholesaleApplication>;

    async fn reject(
        &self,
        reviewer_id: Uuid,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<WholesaleApplication>;
}

pub struct WholesaleManager<U: UnitOfWork> {
    uow: Arc<U>,
    notifier: Arc<dyn Notifier>,
    cache: Arc<dyn CacheInvalidator>,
}

impl<U: UnitOfWork> WholesaleManager<U> {
    pub fn new(
        uow: Arc<U>,
        notifier: Arc<dyn Notifier>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            uow,
            notifier,
            cache,
        }
    }

    async fn decide(
        &self,
        reviewer_id: Uuid,
        id: Uuid,
        decision: ApplicationStatus,
        note: Option<String>,
    ) -> AppResult<WholesaleApplication> {
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        let (application, applicant_email) = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let applications = ctx.wholesale();
                    let application = applications
                        .find_for_update(id)
                        .await?
                        .ok_or(AppError::NotFound)?;
                    application.ensure_pending()?;

                    let application = applications
                        .review(id, decision, reviewer_id, note)
                        .await?;

                    let users = ctx.users();
                    let applicant = if decision == ApplicationStatus::Approved {
                        Some(users.set_role(application.user_id, UserRole::Wholesale).await?)
                    } else {
                        users.find_by_id(application.user_id).await?
                    };

                    ctx.tasks()
                        .complete_for_application(application.id, reviewer_id)
                        .await?;
                    Ok((application, applicant.map(|u| u.email)))
                })
            })
            .await?;

        tracing::info!(
            application_id = %application.id,
            user_id = %application.user_id,
            decision = %decision,
            "Wholesale application reviewed"
        );
        if decision == ApplicationStatus::Approved {
            self.cache.forget_user(application.user_id).await;
        }

        if let Some(email) = applicant_email {
            notify(
                &*self.notifier,
                EmailJob::wholesale_decision(&email, &application),
            )
            .await;
        }
        Ok(application)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl<U: UnitOfWork> WholesaleService for WholesaleManager<U> {
    async fn apply(
        &self,
        user_id: Uuid,
        role: UserRole,
        form: ApplicationForm,
    ) -> AppResult<WholesaleApplication> {
        if !role.can_apply_for_wholesale() {
            return Err(AppError::invalid_state(format!(
                "A {} account cannot apply for wholesale",
                role
            )));
        }
        let business_name = form.business_name.trim().to_string();
        if business_name.is_empty() {
            return Err(AppError::validation("Business name is required"));
        }
        let tax_id = non_blank(form.tax_id);
        let message = non_blank(form.message);

        let application = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let applications = ctx.wholesale();
                    if applications.has_pending(user_id).await? {
                        return Err(AppError::conflict("Pending wholesale application"));
                    }

                    let application = applications
                        .create(user_id, business_name, tax_id, message)
                        .await?;
                    ctx.tasks()
                        .create(NewTask::review_application(
                            application.id,
                            &application.business_name,
                        ))
                        .await?;
                    Ok(application)
                })
            })
            .await?;

        tracing::info!(application_id = %application.id, user_id = %user_id, "Wholesale application submitted");
        Ok(application)
    }

    async fn my_latest(&self, user_id: Uuid) -> AppResult<WholesaleApplication> {
        self.uow
            .wholesale()
            .latest_for_user(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn list(
        &self,
        status: Option<ApplicationStatus>,
        params: PaginationParams,
    ) -> AppResult<Paginated<WholesaleApplication>> {
        let page = self.uow.wholesale().list(status, &params).await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn approve(
        &self,
        reviewer_id: Uuid,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<WholesaleApplication> {
        self.decide(reviewer_id, id, ApplicationStatus::Approved, note)
            .await
    }

    async fn reject(
        &self,
        reviewer_id: Uuid,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<WholesaleApplication> {
        self.decide(reviewer_id, id, ApplicationStatus::Rejected, note)
            .await
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use sea_orm::{DatabaseConnection, DbBackend, MockDatabase};

    use super::*;
    use crate::infra::repositories::fixtures::{
        affected, application_row, executed_sql, matching, user_row,
    };
    use crate::infra::{MockCacheInvalidator, Persistence};
    use crate::jobs::MockNotifier;

    fn manager(
        db: &DatabaseConnection,
        notifier: MockNotifier,
        cache: MockCacheInvalidator,
    ) -> WholesaleManager<Persistence> {
        WholesaleManager::new(
            Arc::new(Persistence::new(db.clone())),
            Arc::new(notifier),
            Arc::new(cache),
        )
    }

    fn emails_once(to: &'static str) -> MockNotifier {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(move |job| job.to == to)
            .times(1)
            .returning(|_| Ok(()));
        notifier
    }

    #[tokio::test]
    async fn approval_upgrades_the_role_and_evicts_the_cached_identity() {
        let (id, applicant) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([
                vec![application_row(id, applicant, "pending")],
                vec![application_row(id, applicant, "pending")],
                vec![application_row(id, applicant, "approved")],
            ])
            .append_query_results([
                vec![user_row(applicant, UserRole::Retail)],
                vec![user_row(applicant, UserRole::Wholesale)],
            ])
            .append_exec_results([affected(1)])
            .into_connection();

        let mut cache = MockCacheInvalidator::new();
        cache
            .expect_forget_user()
            .with(eq(applicant))
            .times(1)
            .returning(|_| ());

        let application = manager(&db, emails_once("wholesale@example.com"), cache)
            .approve(Uuid::new_v4(), id, None)
            .await
            .unwrap();
        assert_eq!(application.status, ApplicationStatus::Approved);

        let sql = executed_sql(db);
        assert!(sql.last().is_some_and(|s| s == "COMMIT"));
        let role = matching(&sql, r#"UPDATE "users""#);
        assert_eq!(role.len(), 1);
        assert!(role[0].contains("'wholesale'"));
        assert!(matching(&sql, r#"UPDATE "tasks""#)[0].contains(&id.to_string()));
    }

    #[tokio::test]
    async fn rejection_keeps_the_role_and_the_cached_identity() {
        let (id, applicant) = (Uuid::new_v4(), Uuid::new_v4());
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([
                vec![application_row(id, applicant, "pending")],
                vec![application_row(id, applicant, "pending")],
                vec![application_row(id, applicant, "rejected")],
            ])
            .append_query_results([vec![user_row(applicant, UserRole::Retail)]])
            .append_exec_results([affected(1)])
            .into_connection();

        let mut cache = MockCacheInvalidator::new();
        cache.expect_forget_user().never();

        let application = manager(&db, emails_once("retail@example.com"), cache)
            .reject(Uuid::new_v4(), id, Some("  ".to_string()))
            .await
            .unwrap();
        assert_eq!(application.status, ApplicationStatus::Rejected);
        assert!(matching(&executed_sql(db), r#"UPDATE "users""#).is_empty());
    }

    #[tokio::test]
    async fn reviewed_applications_cannot_be_decided_again() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![application_row(id, Uuid::new_v4(), "approved")]])
            .into_connection();

        let mut cache = MockCacheInvalidator::new();
        cache.expect_forget_user().never();

        let result = manager(&db, MockNotifier::new(), cache)
            .approve(Uuid::new_v4(), id, None)
            .await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
        assert!(executed_sql(db).last().is_some_and(|s| s == "ROLLBACK"));
    }
}
