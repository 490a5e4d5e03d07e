//! User repository with soft delete support.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::base::{convert_all, convert_one, fetch_page, is_unique_violation};
use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, User, UserFilter, UserRole, UserStatus};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// By default, all query methods exclude soft-deleted records.
/// Use `*_with_deleted` variants to include them.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find active user by ID (excludes soft-deleted)
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by ID including soft-deleted
    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find active user by email (excludes soft-deleted)
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// List active users matching `filter`, newest first
    async fn list(
        &self,
        filter: &UserFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<User>, u64)>;

    /// Number of users who signed up with this user's referral code
    async fn count_referred(&self, referrer_id: Uuid) -> AppResult<u64>;

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User>;

    async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User>;

    /// Soft delete user by ID (sets deleted_at timestamp)
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Restore a soft-deleted user
    async fn restore(&self, id: Uuid) -> AppResult<User>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        find_active(&self.db, id).await
    }

    async fn find_by_id_with_deleted(&self, id: Uuid) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        convert_one(model)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;
        convert_one(model)
    }

    async fn list(
        &self,
        filter: &UserFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<User>, u64)> {
        let mut select = UserEntity::find().filter(user::Column::DeletedAt.is_null());
        if let Some(role) = filter.role {
            select = select.filter(user::Column::Role.eq(role.as_str()));
        }
        if let Some(status) = filter.status {
            select = select.filter(user::Column::Status.eq(status.as_str()));
        }
        let select = select.order_by_desc(user::Column::CreatedAt);

        let (models, total) = fetch_page(&self.db, select, params).await?;
        Ok((convert_all(models)?, total))
    }

    async fn count_referred(&self, referrer_id: Uuid) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::ReferredBy.eq(referrer_id))
            .filter(user::Column::DeletedAt.is_null())
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn set_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        update_active(&self.db, id, |active| {
            active.status = Set(status.as_str().to_string());
        })
        .await
    }

    async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        update_role(&self.db, id, role).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let now = chrono::Utc::now();
        update_active(&self.db, id, |active| {
            active.deleted_at = Set(Some(now));
        })
        .await?;
        Ok(())
    }

    async fn restore(&self, id: Uuid) -> AppResult<User> {
        let record = UserEntity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_not_null())
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::validation("User is not deleted or does not exist"))?;

        let mut active: ActiveModel = record.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(chrono::Utc::now());

        User::try_from(active.update(&self.db).await?)
    }
}

/// Transaction-aware user repository.
///
/// Executes all operations within the provided transaction.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Find active user by ID (excludes soft-deleted)
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        find_active(self.txn, id).await
    }

    /// Find user by email including soft-deleted.
    ///
    /// Registration uses this so a deleted account's email stays reserved.
    pub async fn find_by_email_with_deleted(&self, email: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.txn)
            .await?;
        convert_one(model)
    }

    /// Active owner of a referral code
    pub async fn find_by_referral_code(&self, code: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::ReferralCode.eq(code))
            .filter(user::Column::DeletedAt.is_null())
            .one(self.txn)
            .await?;
        convert_one(model)
    }

    /// Whether any user, deleted or not, already holds `code`
    pub async fn referral_code_taken(&self, code: &str) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(user::Column::ReferralCode.eq(code))
            .count(self.txn)
            .await?;
        Ok(count > 0)
    }

    /// Create a new user with the default role
    pub async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            name: Set(new_user.name),
            role: Set(UserRole::default().as_str().to_string()),
            status: Set(UserStatus::Active.as_str().to_string()),
            referral_code: Set(new_user.referral_code),
            referred_by: Set(new_user.referred_by),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let model = active_model.insert(self.txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("User")
            } else {
                AppError::from(e)
            }
        })?;
        User::try_from(model)
    }

    pub async fn set_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        update_role(self.txn, id, role).await
    }
}

async fn find_active<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<Option<User>> {
    let model = UserEntity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?;
    convert_one(model)
}

async fn update_role<C: ConnectionTrait>(db: &C, id: Uuid, role: UserRole) -> AppResult<User> {
    update_active(db, id, |active| {
        active.role = Set(role.as_str().to_string());
    })
    .await
}

/// Load an active user, apply `change`, bump `updated_at` and save.
async fn update_active<C, F>(db: &C, id: Uuid, change: F) -> AppResult<User>
where
    C: ConnectionTrait,
    F: FnOnce(&mut ActiveModel),
{
    let record = UserEntity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = record.into();
    change(&mut active);
    active.updated_at = Set(chrono::Utc::now());

    User::try_from(active.update(db).await?)
}
