//! Registration, login, and profile-of-caller endpoints.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::{self, AuthUser};
use crate::errors::AppError;
use crate::models::{User, UserRole, UserStatus};
use crate::AppState;

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// POST /api/auth/register - Create a new account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<User> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = auth::hash_password(&request.password)?;
    let user = state
        .repo
        .create_user(email, request.name.trim(), &password_hash, UserRole::Member)
        .await?;

    success(user)
}

/// POST /api/auth/login - Exchange credentials for an access token.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let Some((user, password_hash)) = state
        .repo
        .find_credentials_by_email(request.email.trim())
        .await?
    else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    if !auth::verify_password(&request.password, &password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    if user.status != UserStatus::Active {
        return Err(AppError::Unauthorized("Account is disabled".to_string()));
    }

    state.repo.update_last_login(&user.id).await?;

    let access_token = auth::issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.token_ttl_secs,
    )?;

    success(LoginResponse { access_token, user })
}

/// GET /api/auth/me - The authenticated caller's profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<User> {
    let user = state
        .repo
        .get_user(&auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    success(user)
}
