//! Team API endpoints, including roster management.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{
    AddTeamMemberRequest, CreateTeamRequest, Team, TeamMember, TeamRole, UpdateTeamMemberRequest,
    UpdateTeamRequest,
};
use crate::AppState;

/// GET /api/teams - List live teams with leader and roster.
pub async fn list_teams(State(state): State<AppState>) -> ApiResult<Vec<Team>> {
    let teams = state.repo.list_teams().await?;
    success(teams)
}

/// GET /api/teams/:id - Get a single team.
pub async fn get_team(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Team> {
    let team = state
        .repo
        .get_team(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))?;

    success(team)
}

/// POST /api/teams - Create a team led by the caller.
pub async fn create_team(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<CreateTeamRequest>,
) -> ApiResult<Team> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let team = state.repo.create_team(&auth_user.user_id, &request).await?;
    success(team)
}

/// PUT /api/teams/:id - Update a team.
pub async fn update_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTeamRequest>,
) -> ApiResult<Team> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
    }

    let team = state.repo.update_team(&id, &request).await?;
    success(team)
}

/// DELETE /api/teams/:id - Move a team to the trash.
pub async fn delete_team(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.soft_delete_team(&id).await?;
    success(())
}

/// POST /api/teams/:id/restore - Recover a team from the trash.
pub async fn restore_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Team> {
    let team = state.repo.restore_team(&id).await?;
    success(team)
}

// ==================== TEAM MEMBERS ====================

/// GET /api/teams/:id/members - The team roster.
pub async fn get_team_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<TeamMember>> {
    if state.repo.get_team(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Team {} not found", id)));
    }

    let members = state.repo.get_team_members(&id).await?;
    success(members)
}

/// POST /api/teams/:id/members - Add a user to the roster.
pub async fn add_team_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AddTeamMemberRequest>,
) -> ApiResult<TeamMember> {
    let role = request.role.unwrap_or(TeamRole::Member);
    let member = state
        .repo
        .add_team_member(&id, &request.user_id, role)
        .await?;

    success(member)
}

/// PUT /api/teams/:id/members/:userId - Change a member's role.
pub async fn update_team_member_role(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
    Json(request): Json<UpdateTeamMemberRequest>,
) -> ApiResult<TeamMember> {
    let member = state
        .repo
        .update_team_member_role(&id, &user_id, request.role)
        .await?;

    success(member)
}

/// DELETE /api/teams/:id/members/:userId - Remove a member.
pub async fn remove_team_member(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(String, String)>,
) -> ApiResult<()> {
    state.repo.remove_team_member(&id, &user_id).await?;
    success(())
}
