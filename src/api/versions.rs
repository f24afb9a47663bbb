//! Meeting version endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{CreateVersionRequest, Meeting, MeetingVersion};
use crate::search::extract_text;
use crate::AppState;

/// GET /api/meetings/:id/versions - List snapshots, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<MeetingVersion>> {
    let versions = state.repo.list_versions(&id).await?;
    success(versions)
}

/// POST /api/meetings/:id/versions - Snapshot the meeting's content.
pub async fn create_version(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<CreateVersionRequest>,
) -> ApiResult<MeetingVersion> {
    let version = state
        .repo
        .create_version(
            &id,
            &request.content,
            &auth_user.user_id,
            request.description.as_deref(),
        )
        .await?;

    success(version)
}

/// POST /api/meetings/:id/versions/:versionId/restore - Copy a snapshot's
/// content back onto the meeting.
pub async fn restore_version(
    State(state): State<AppState>,
    Path((id, version_id)): Path<(String, String)>,
) -> ApiResult<Meeting> {
    let version = state
        .repo
        .get_version(&id, &version_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Version not found".to_string()))?;

    let content_text = extract_text(&version.content);
    let meeting = state
        .repo
        .set_meeting_content(&id, &version.content, &content_text)
        .await?;

    if let Err(e) = state.search.index_meeting(&meeting).await {
        tracing::warn!("Failed to re-index meeting after version restore: {}", e);
    }

    success(meeting)
}
