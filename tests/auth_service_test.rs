//! Authentication service tests.

mod common;

use storefront::config::Config;
use storefront::domain::{Password, UserRole, UserStatus};
use storefront::errors::AppError;
use storefront::infra::MockUserRepository;
use storefront::services::{AuthService, Authenticator, Registration};

use common::{silent_notifier, user, TestUnitOfWork};

const PASSWORD: &str = "correct horse battery";

fn authenticator(users: MockUserRepository) -> Authenticator<TestUnitOfWork> {
    let config = Config::for_secrets(
        "test-secret-key-for-testing-only-32chars",
        "whsec_test_secret_for_signatures",
    );
    Authenticator::new(
        TestUnitOfWork::new().with_users(users).build(),
        config,
        silent_notifier(),
    )
}

fn users_with_password(role: UserRole, status: UserStatus) -> MockUserRepository {
    let mut account = user(role);
    account.status = status;
    account.password_hash = Password::new(PASSWORD)
        .expect("Hashing should succeed")
        .into_string();

    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .withf(|email| email == "jane@example.com")
        .returning(move |_| Ok(Some(account.clone())));
    users
}

#[tokio::test]
async fn test_login_issues_verifiable_token() {
    let auth = authenticator(users_with_password(UserRole::Wholesale, UserStatus::Active));

    let token = auth
        .login(" Jane@Example.com ".to_string(), PASSWORD.to_string())
        .await
        .unwrap();
    assert_eq!(token.token_type, "Bearer");

    let claims = auth.verify_token(&token.access_token).unwrap();
    assert_eq!(claims.email, "jane@example.com");
    assert_eq!(claims.role, UserRole::Wholesale);
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let auth = authenticator(users_with_password(UserRole::Retail, UserStatus::Active));

    let result = auth
        .login("jane@example.com".to_string(), "not the password".to_string())
        .await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_with_unknown_email() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().returning(|_| Ok(None));

    let result = authenticator(users)
        .login("nobody@example.com".to_string(), PASSWORD.to_string())
        .await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_suspended_account_cannot_sign_in() {
    let auth = authenticator(users_with_password(UserRole::Retail, UserStatus::Suspended));

    let result = auth
        .login("jane@example.com".to_string(), PASSWORD.to_string())
        .await;

    assert!(matches!(result, Err(AppError::AccountSuspended)));
}

#[tokio::test]
async fn test_verify_token_rejects_garbage() {
    let auth = authenticator(MockUserRepository::new());

    assert!(auth.verify_token("not-a-jwt").is_err());
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    // Fails before any repository or transaction is used
    let result = authenticator(MockUserRepository::new())
        .register(Registration {
            email: "new@example.com".to_string(),
            password: "short".to_string(),
            name: "New Buyer".to_string(),
            referral_code: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}
