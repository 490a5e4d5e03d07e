//! User service - profile, referrals and admin account management.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::parallel;
use crate::domain::{ReferralSummary, User, UserFilter, UserRole, UserStatus};
use crate::errors::{AppError, AppResult};
use crate::infra::{CacheInvalidator, UnitOfWork};
use crate::types::{Paginated, PaginationParams};

/// By default, operations exclude soft-deleted users.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get active user by ID (excludes soft-deleted)
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// Referral code, number of referred signups and commission totals
    async fn referral_summary(&self, id: Uuid) -> AppResult<ReferralSummary>;

    async fn list_users(
        &self,
        filter: UserFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<User>>;

    async fn activate_user(&self, id: Uuid) -> AppResult<User>;

    /// Suspend an account. Admins cannot suspend themselves.
    async fn suspend_user(&self, actor_id: Uuid, id: Uuid) -> AppResult<User>;

    async fn set_role(&self, actor_id: Uuid, id: Uuid, role: UserRole) -> AppResult<User>;

    /// Soft delete user (sets deleted_at timestamp)
    async fn delete_user(&self, actor_id: Uuid, id: Uuid) -> AppResult<()>;

    /// Restore a soft-deleted user
    async fn restore_user(&self, id: Uuid) -> AppResult<User>;
}

pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheInvalidator>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheInvalidator>) -> Self {
        Self { uow, cache }
    }
}

fn ensure_not_self(actor_id: Uuid, id: Uuid, action: &str) -> AppResult<()> {
    if actor_id == id {
        return Err(AppError::bad_request(format!("You cannot {} your own account", action)));
    }
    Ok(())
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow
            .users()
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn referral_summary(&self, id: Uuid) -> AppResult<ReferralSummary> {
        let users = self.uow.users();
        let commissions = self.uow.commissions();

        let (user, referred_users, (pending, paid)) = parallel::join3(
            users.find_by_id(id),
            users.count_referred(id),
            commissions.totals_for(id),
        )
        .await?;
        let user = user.ok_or(AppError::NotFound)?;

        Ok(ReferralSummary {
            referral_code: user.referral_code,
            referred_users,
            pending_commission: pending,
            paid_commission: paid,
        })
    }

    async fn list_users(
        &self,
        filter: UserFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<User>> {
        let page = self.uow.users().list(&filter, &params).await?;
        Ok(Paginated::from_page(&params, page))
    }

    async fn activate_user(&self, id: Uuid) -> AppResult<User> {
        let user = self.uow.users().set_status(id, UserStatus::Active).await?;
        self.cache.forget_user(id).await;
        tracing::info!(user_id = %id, "User activated");
        Ok(user)
    }

    async fn suspend_user(&self, actor_id: Uuid, id: Uuid) -> AppResult<User> {
        ensure_not_self(actor_id, id, "suspend")?;
        let user = self.uow.users().set_status(id, UserStatus::Suspended).await?;
        self.cache.forget_user(id).await;
        tracing::info!(user_id = %id, actor_id = %actor_id, "User suspended");
        Ok(user)
    }

    async fn set_role(&self, actor_id: Uuid, id: Uuid, role: UserRole) -> AppResult<User> {
        // Keeps at least the acting admin in the back office
        if role != UserRole::Admin {
            ensure_not_self(actor_id, id, "demote")?;
        }
        let user = self.uow.users().set_role(id, role).await?;
        self.cache.forget_user(id).await;
        tracing::info!(user_id = %id, role = %role, "User role changed");
        Ok(user)
    }

    async fn delete_user(&self, actor_id: Uuid, id: Uuid) -> AppResult<()> {
        ensure_not_self(actor_id, id, "delete")?;
        self.uow.users().delete(id).await?;
        self.cache.forget_user(id).await;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn restore_user(&self, id: Uuid) -> AppResult<User> {
        let user = self.uow.users().restore(id).await?;
        self.cache.forget_user(id).await;
        tracing::info!(user_id = %id, "User restored");
        Ok(user)
    }
}
