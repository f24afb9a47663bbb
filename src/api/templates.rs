//! Meeting template endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::{success, ApiResult};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{CreateTemplateRequest, Template, UpdateTemplateRequest};
use crate::AppState;

/// GET /api/templates - List templates, newest first.
pub async fn list_templates(State(state): State<AppState>) -> ApiResult<Vec<Template>> {
    let templates = state.repo.list_templates().await?;
    success(templates)
}

/// GET /api/templates/:id - Get a single template.
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Template> {
    let template = state
        .repo
        .get_template(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)))?;

    success(template)
}

/// POST /api/templates - Create a template.
pub async fn create_template(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<CreateTemplateRequest>,
) -> ApiResult<Template> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let template = state
        .repo
        .create_template(&auth_user.user_id, &request)
        .await?;

    success(template)
}

/// PUT /api/templates/:id - Update a template.
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateTemplateRequest>,
) -> ApiResult<Template> {
    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("Name cannot be empty".to_string()));
        }
    }

    let template = state.repo.update_template(&id, &request).await?;
    success(template)
}

/// DELETE /api/templates/:id - Delete a template.
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_template(&id).await?;
    success(())
}
