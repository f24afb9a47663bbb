//! Meeting participant endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::models::{AddParticipantRequest, MeetingParticipant, ParticipantRole};
use crate::AppState;

/// GET /api/meetings/:id/participants - List participants with user
/// summaries.
pub async fn list_participants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<MeetingParticipant>> {
    let participants = state.repo.list_participants(&id).await?;
    success(participants)
}

/// POST /api/meetings/:id/participants - Add a participant.
pub async fn add_participant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddParticipantRequest>,
) -> ApiResult<MeetingParticipant> {
    let role = request.role.unwrap_or(ParticipantRole::Participant);
    let participant = state
        .repo
        .add_participant(&id, &request.user_id, role)
        .await?;

    success(participant)
}

/// DELETE /api/meetings/:id/participants/:userId - Remove a participant.
pub async fn remove_participant(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<()> {
    state.repo.remove_participant(&id, &user_id).await?;
    success(())
}
