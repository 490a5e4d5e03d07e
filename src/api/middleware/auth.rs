//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::{CurrentUser, UserRole, UserStatus};
use crate::errors::AppError;

/// JWT authentication middleware.
///
/// Validates the bearer token, then resolves the account (cache first,
/// database on a miss) so that suspensions and role changes apply to
/// tokens issued before them. The resolved `CurrentUser` is inserted into
/// the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .ok_or(AppError::Unauthorized)?;

    let claims = state.services.auth().verify_token(token)?;
    let current_user = resolve_user(&state, claims.sub).await?;

    if current_user.status == UserStatus::Suspended {
        return Err(AppError::AccountSuspended);
    }

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

async fn resolve_user(state: &AppState, user_id: uuid::Uuid) -> Result<CurrentUser, AppError> {
    match state.cache.get_user(&user_id).await {
        Ok(Some(cached)) => return Ok(cached),
        Ok(None) => {}
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "User cache unavailable"),
    }

    let user = state
        .services
        .users()
        .get_user(user_id)
        .await
        .map_err(|e| match e {
            // Deleted since the token was issued
            AppError::NotFound => AppError::Unauthorized,
            other => other,
        })?;
    user.ensure_can_sign_in()?;

    let current_user = CurrentUser::from(&user);
    if let Err(e) = state.cache.set_user(&current_user).await {
        tracing::warn!(user_id = %user_id, error = %e, "Failed to cache user");
    }
    Ok(current_user)
}

/// Require admin role, returns Forbidden error if not admin.
pub fn require_admin(user: &CurrentUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Require `role` (admins always pass).
pub fn require_role(user: &CurrentUser, role: UserRole) -> Result<(), AppError> {
    if user.role.can_access(&role) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "someone@example.com".into(),
            role,
            status: UserStatus::Active,
        }
    }

    #[test]
    fn admin_guard() {
        assert!(require_admin(&user(UserRole::Admin)).is_ok());
        assert!(matches!(
            require_admin(&user(UserRole::Wholesale)),
            Err(AppError::Forbidden)
        ));
    }

    #[test]
    fn role_guard_lets_admins_through() {
        assert!(require_role(&user(UserRole::Distributor), UserRole::Distributor).is_ok());
        assert!(require_role(&user(UserRole::Admin), UserRole::Distributor).is_ok());
        assert!(require_role(&user(UserRole::Retail), UserRole::Distributor).is_err());
    }
}
