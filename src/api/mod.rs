//! REST API module.
//!
//! Contains all API routes and handlers. Responses use a uniform
//! `{ success, data }` envelope; errors are mapped by [`crate::errors`].

mod action_items;
mod auth;
mod links;
mod meetings;
mod participants;
mod permissions;
mod projects;
mod teams;
mod templates;
mod users;
mod versions;

pub use action_items::*;
pub use auth::*;
pub use links::*;
pub use meetings::*;
pub use participants::*;
pub use permissions::*;
pub use projects::*;
pub use teams::*;
pub use templates::*;
pub use users::*;
pub use versions::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, crate::errors::AppError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}
