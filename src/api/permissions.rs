//! Meeting permission endpoints. Grants are a flat list; nothing here
//! computes effective access.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{MeetingPermission, SetPermissionRequest};
use crate::AppState;

/// GET /api/meetings/:id/permissions - The grant list.
pub async fn list_permissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<MeetingPermission>> {
    let permissions = state.repo.list_permissions(&id).await?;
    success(permissions)
}

/// POST /api/meetings/:id/permissions - Grant access to a user or team.
pub async fn set_permission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetPermissionRequest>,
) -> ApiResult<MeetingPermission> {
    if request.user_id.is_none() && request.team_id.is_none() {
        return Err(AppError::Validation(
            "A grant must name a userId or a teamId".to_string(),
        ));
    }

    if let Some(user_id) = &request.user_id {
        if state.repo.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
    }
    if let Some(team_id) = &request.team_id {
        if state.repo.get_team(team_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Team {} not found", team_id)));
        }
    }

    let permission = state.repo.set_permission(&id, &request).await?;
    success(permission)
}

/// DELETE /api/meetings/:id/permissions/:permissionId - Revoke a grant.
pub async fn remove_permission(
    State(state): State<AppState>,
    Path((id, permission_id)): Path<(String, String)>,
) -> ApiResult<()> {
    state.repo.remove_permission(&id, &permission_id).await?;
    success(())
}
