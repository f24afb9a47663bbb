//! User directory endpoints.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{UpdateProfileRequest, User};
use crate::AppState;

/// Query parameters for the user directory search.
#[derive(Debug, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/users/search - Substring search over names and emails.
pub async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<UserSearchQuery>,
) -> ApiResult<Vec<User>> {
    let users = state.repo.search_users(params.q.trim()).await?;
    success(users)
}

/// PUT /api/users/me - Update the caller's own profile.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<User> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
    }

    let user = state
        .repo
        .update_profile(&auth_user.user_id, &request)
        .await?;

    success(user)
}
