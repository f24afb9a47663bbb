//! Meeting API endpoints: CRUD, trash lifecycle, search, and impact
//! analysis.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::AuthUser;
use crate::db::recovery_deadline;
use crate::errors::AppError;
use crate::models::{CreateMeetingRequest, ImpactAnalysis, Meeting, UpdateMeetingRequest};
use crate::search::extract_text;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Search query string.
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 100;

/// Search response with meetings and metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Single search result item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub meeting: Meeting,
    pub score: f32,
}

/// A trashed meeting with its recovery deadline.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashedMeeting {
    pub meeting: Meeting,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// GET /api/meetings - List the caller's meetings.
pub async fn list_meetings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<Meeting>> {
    let meetings = state.repo.list_meetings(&auth_user.user_id).await?;
    success(meetings)
}

/// GET /api/meetings/search - Full-text search over meetings.
pub async fn search_meetings(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let limit = params.limit.min(MAX_SEARCH_LIMIT);

    let hits = state.search.search(&params.q, limit, params.offset)?;

    let ids: Vec<String> = hits.iter().map(|h| h.meeting_id.clone()).collect();
    let meetings = state.repo.meetings_by_ids(&ids).await?;

    // Soft-deleted hits drop out during resolution, so scores are joined
    // back by id rather than by position.
    let results: Vec<SearchResultItem> = meetings
        .into_iter()
        .map(|meeting| {
            let score = hits
                .iter()
                .find(|h| h.meeting_id == meeting.id)
                .map(|h| h.score)
                .unwrap_or_default();
            SearchResultItem { meeting, score }
        })
        .collect();

    let total = results.len();

    success(SearchResponse {
        results,
        total,
        limit,
        offset: params.offset,
    })
}

/// GET /api/meetings/trash - The caller's trashed meetings.
pub async fn list_trash(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Vec<TrashedMeeting>> {
    let meetings = state.repo.list_deleted_meetings(&auth_user.user_id).await?;

    let trashed = meetings
        .into_iter()
        .map(|meeting| {
            let expires_at = meeting
                .deleted_at
                .as_deref()
                .and_then(recovery_deadline)
                .map(|t| t.to_rfc3339());
            TrashedMeeting {
                meeting,
                expires_at,
            }
        })
        .collect();

    success(trashed)
}

/// GET /api/meetings/:id - Get a single meeting.
pub async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Meeting> {
    let meeting = state.repo.require_meeting(&id).await?;
    success(meeting)
}

/// GET /api/meetings/:id/impact - Which meetings link to this one.
pub async fn get_impact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ImpactAnalysis> {
    let impacted = state.repo.get_impact(&id).await?;
    success(ImpactAnalysis {
        impacted_count: impacted.len(),
        impacted_meetings: impacted,
    })
}

/// POST /api/meetings - Create a new meeting.
pub async fn create_meeting(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<CreateMeetingRequest>,
) -> ApiResult<Meeting> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let content_text = request
        .content_text
        .clone()
        .or_else(|| request.content.as_ref().map(extract_text));

    let meeting = state
        .repo
        .create_meeting(&auth_user.user_id, &request, content_text)
        .await?;

    if let Err(e) = state.search.index_meeting(&meeting).await {
        tracing::warn!("Failed to index meeting: {}", e);
    }

    success(meeting)
}

/// PUT /api/meetings/:id - Update a meeting (last-write-wins).
pub async fn update_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMeetingRequest>,
) -> ApiResult<Meeting> {
    if let Some(title) = &request.title {
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title cannot be empty".to_string()));
        }
    }

    let text_override = request
        .content_text
        .clone()
        .or_else(|| request.content.as_ref().map(extract_text));

    let meeting = state.repo.update_meeting(&id, &request, text_override).await?;

    if let Err(e) = state.search.index_meeting(&meeting).await {
        tracing::warn!("Failed to re-index meeting: {}", e);
    }

    success(meeting)
}

/// DELETE /api/meetings/:id - Move a meeting to the trash.
pub async fn delete_meeting(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.soft_delete_meeting(&id).await?;

    if let Err(e) = state.search.remove_meeting(&id).await {
        tracing::warn!("Failed to remove meeting from index: {}", e);
    }

    success(())
}

/// POST /api/meetings/:id/restore - Recover a meeting from the trash.
pub async fn restore_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Meeting> {
    let meeting = state.repo.restore_meeting(&id).await?;

    if let Err(e) = state.search.index_meeting(&meeting).await {
        tracing::warn!("Failed to re-index restored meeting: {}", e);
    }

    success(meeting)
}

/// DELETE /api/meetings/:id/permanent - Permanently delete a meeting.
pub async fn permanent_delete_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.permanent_delete_meeting(&id).await?;

    if let Err(e) = state.search.remove_meeting(&id).await {
        tracing::warn!("Failed to remove meeting from index: {}", e);
    }

    success(())
}
