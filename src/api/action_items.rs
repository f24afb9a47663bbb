//! Action item endpoints. Creation and listing are scoped to a meeting;
//! item updates and deletes address the item directly.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{ActionItem, CreateActionItemRequest, UpdateActionItemRequest};
use crate::AppState;

/// GET /api/meetings/:id/action-items - List a meeting's action items.
pub async fn list_action_items(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ActionItem>> {
    let items = state.repo.list_action_items(&id).await?;
    success(items)
}

/// POST /api/meetings/:id/action-items - Create an action item.
pub async fn create_action_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CreateActionItemRequest>,
) -> ApiResult<ActionItem> {
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }

    let item = state.repo.create_action_item(&id, &request).await?;
    success(item)
}

/// PUT /api/action-items/:id - Update an action item.
pub async fn update_action_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateActionItemRequest>,
) -> ApiResult<ActionItem> {
    if let Some(description) = &request.description {
        if description.trim().is_empty() {
            return Err(AppError::Validation(
                "Description cannot be empty".to_string(),
            ));
        }
    }

    let item = state.repo.update_action_item(&id, &request).await?;
    success(item)
}

/// DELETE /api/action-items/:id - Delete an action item.
pub async fn delete_action_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_action_item(&id).await?;
    success(())
}
