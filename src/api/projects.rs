//! Project API endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{AccessLevel, CreateProjectRequest, Project, UpdateProjectRequest};
use crate::AppState;

fn validate_project_access(level: Option<AccessLevel>) -> Result<(), AppError> {
    if level == Some(AccessLevel::Custom) {
        return Err(AppError::Validation(
            "Projects only support public, team, or private access".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/projects - List live projects, newest update first.
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Vec<Project>> {
    let projects = state.repo.list_projects().await?;
    success(projects)
}

/// GET /api/projects/trash - List soft-deleted projects.
pub async fn list_deleted_projects(State(state): State<AppState>) -> ApiResult<Vec<Project>> {
    let projects = state.repo.list_deleted_projects().await?;
    success(projects)
}

/// GET /api/projects/:id - Project detail with its live meetings.
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Project> {
    let project = state
        .repo
        .get_project(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;

    success(project)
}

/// POST /api/projects - Create a project owned by the caller.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Project> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    validate_project_access(request.default_access_level)?;

    let project = state
        .repo
        .create_project(&auth_user.user_id, &request)
        .await?;

    success(project)
}

/// PUT /api/projects/:id - Update a project.
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Project> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
    }
    validate_project_access(request.default_access_level)?;

    let project = state.repo.update_project(&id, &request).await?;
    success(project)
}

/// DELETE /api/projects/:id - Move a project to the trash.
pub async fn delete_project(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.soft_delete_project(&id).await?;
    success(())
}

/// POST /api/projects/:id/restore - Recover a project from the trash.
pub async fn restore_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Project> {
    let project = state.repo.restore_project(&id).await?;
    success(project)
}
