//! Meeting link endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateLinkRequest, MeetingLink, MeetingLinks};
use crate::AppState;

/// GET /api/meetings/:id/links - Outbound and inbound edges.
pub async fn get_links(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MeetingLinks> {
    let links = state.repo.get_links(&id).await?;
    success(links)
}

/// POST /api/meetings/:id/links - Link this meeting to another.
pub async fn create_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateLinkRequest>,
) -> ApiResult<MeetingLink> {
    let target = request.target_meeting_id.trim();
    if target.is_empty() {
        return Err(AppError::Validation(
            "targetMeetingId is required".to_string(),
        ));
    }
    if target == id {
        return Err(AppError::Validation(
            "A meeting cannot link to itself".to_string(),
        ));
    }

    let link = state.repo.create_link(&id, target).await?;
    success(link)
}

/// DELETE /api/meetings/:id/links/:targetId - Remove a link edge.
pub async fn delete_link(
    State(state): State<AppState>,
    Path((id, target_id)): Path<(String, String)>,
) -> ApiResult<()> {
    state.repo.delete_link(&id, &target_id).await?;
    success(())
}
