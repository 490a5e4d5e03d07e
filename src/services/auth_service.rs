//! Authentication service - registration, login and token verification.
//!
//! Passwords are hashed through the domain `Password` value object and
//! signup runs in one transaction so the email check, referral lookup and
//! referral code allocation cannot race with a concurrent signup.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, REFERRAL_CODE_MAX_ATTEMPTS, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{NewUser, Password, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::jobs::{notify, EmailJob, Notifier};
use crate::utils::{generate_referral_code, normalize_referral_code};

/// Hash verified when the email is unknown so both paths cost the same.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    Password::new("timing-equalizer-password")
        .map(Password::into_string)
        .unwrap_or_default()
});

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Signup input, already shape-validated by the handler
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub referral_code: Option<String>,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a retail account, crediting the owner of `referral_code`.
    async fn register(&self, registration: Registration) -> AppResult<User>;

    /// Login and return JWT token
    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
    notifier: Arc<dyn Notifier>,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            uow,
            config,
            notifier,
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let email = normalize_email(&registration.email);
        let name = registration.name.trim().to_string();
        let referral_code = registration
            .referral_code
            .as_deref()
            .map(normalize_referral_code)
            .filter(|c| !c.is_empty());

        // Hash outside the transaction, argon2 is slow
        let password_hash = Password::new(&registration.password)?.into_string();

        let user = self
            .uow
            .transaction(move |ctx| {
                Box::pin(async move {
                    let users = ctx.users();

                    // Soft-deleted accounts keep their email reserved
                    if users.find_by_email_with_deleted(&email).await?.is_some() {
                        return Err(AppError::conflict("User"));
                    }

                    let referred_by = match referral_code {
                        Some(code) => Some(
                            users
                                .find_by_referral_code(&code)
                                .await?
                                .ok_or_else(|| AppError::validation("Unknown referral code"))?
                                .id,
                        ),
                        None => None,
                    };

                    let mut own_code = None;
                    for _ in 0..REFERRAL_CODE_MAX_ATTEMPTS {
                        let candidate = generate_referral_code();
                        if !users.referral_code_taken(&candidate).await? {
                            own_code = Some(candidate);
                            break;
                        }
                    }
                    let own_code = own_code
                        .ok_or_else(|| AppError::internal("Could not allocate a referral code"))?;

                    users
                        .create(NewUser {
                            email,
                            password_hash,
                            name,
                            referral_code: own_code,
                            referred_by,
                        })
                        .await
                })
            })
            .await?;

        tracing::info!(user_id = %user.id, referred = user.referred_by.is_some(), "User registered");
        notify(
            &*self.notifier,
            EmailJob::welcome(&user.email, &user.name, &user.referral_code),
        )
        .await;

        Ok(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_email(&normalize_email(&email)).await?;

        // Verify against a real hash even for unknown emails so response
        // timing does not reveal which addresses exist
        let stored = match &user {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::from_hash(DUMMY_HASH.clone()),
        };
        let password_valid = stored.verify(&password);

        match user {
            Some(user) if password_valid => {
                user.ensure_can_sign_in()?;
                tracing::debug!(user_id = %user.id, "User signed in");
                generate_token(&user, &self.config)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }
}
