//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{
    ROLE_ADMIN, ROLE_DISTRIBUTOR, ROLE_RETAIL, ROLE_WHOLESALE, STATUS_ACTIVE, STATUS_SUSPENDED,
};
use crate::errors::{AppError, AppResult};

string_enum! {
    /// User roles
    pub enum UserRole {
        Admin => ROLE_ADMIN,
        Distributor => ROLE_DISTRIBUTOR,
        Retail => ROLE_RETAIL,
        Wholesale => ROLE_WHOLESALE,
    }
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }

    /// Admins pass every role check.
    pub fn can_access(&self, required: &UserRole) -> bool {
        self.is_admin() || self == required
    }

    /// Buyers that may be upgraded to wholesale pricing.
    pub fn can_apply_for_wholesale(&self) -> bool {
        matches!(self, UserRole::Retail)
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Retail
    }
}

string_enum! {
    /// Account status controlled by admins
    pub enum UserStatus {
        Active => STATUS_ACTIVE,
        Suspended => STATUS_SUSPENDED,
    }
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete timestamp (None = active, Some = deleted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_suspended(&self) -> bool {
        self.status == UserStatus::Suspended
    }

    /// Fails unless the account may sign in and make requests.
    pub fn ensure_can_sign_in(&self) -> AppResult<()> {
        if self.is_deleted() {
            return Err(AppError::Unauthorized);
        }
        if self.is_suspended() {
            return Err(AppError::AccountSuspended);
        }
        Ok(())
    }
}

/// Identity attached to an authenticated request.
///
/// Serializable so it can be cached between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            status: user.status,
        }
    }
}

/// Data required to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
}

/// Admin listing filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Code other customers enter at signup to credit this user
    #[schema(example = "K7QX2MPA")]
    pub referral_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            status: user.status,
            referral_code: user.referral_code,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(status: UserStatus) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            password_hash: "hash".into(),
            name: "A".into(),
            role: UserRole::Retail,
            status,
            referral_code: "ABCDEFGH".into(),
            referred_by: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), *role);
        }
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn admin_can_access_everything() {
        assert!(UserRole::Admin.can_access(&UserRole::Distributor));
        assert!(UserRole::Distributor.can_access(&UserRole::Distributor));
        assert!(!UserRole::Retail.can_access(&UserRole::Distributor));
    }

    #[test]
    fn only_retail_can_apply_for_wholesale() {
        assert!(UserRole::Retail.can_apply_for_wholesale());
        assert!(!UserRole::Wholesale.can_apply_for_wholesale());
        assert!(!UserRole::Distributor.can_apply_for_wholesale());
    }

    #[test]
    fn suspended_users_cannot_sign_in() {
        assert!(user(UserStatus::Active).ensure_can_sign_in().is_ok());
        assert!(matches!(
            user(UserStatus::Suspended).ensure_can_sign_in(),
            Err(AppError::AccountSuspended)
        ));

        let mut deleted = user(UserStatus::Active);
        deleted.deleted_at = Some(Utc::now());
        assert!(matches!(
            deleted.ensure_can_sign_in(),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn serialized_user_hides_password_hash() {
        let json = serde_json::to_value(user(UserStatus::Active)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "retail");
    }
}
