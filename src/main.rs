//! MeetNotes Backend
//!
//! REST backend for a team meeting-notes workspace: rich-text meeting
//! documents organized under projects and teams, with versions, links,
//! permissions, and full-text search.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MeetNotes Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the signing secret is the development fallback
    if !config.jwt_secret_from_env {
        tracing::warn!("No JWT secret configured (MEETNOTES_JWT_SECRET). Using the development fallback!");
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Initialize search index
    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    // Build initial search index from database
    tracing::info!("Building search index...");
    let meetings = repo.list_all_meetings().await?;
    search.rebuild(&meetings).await?;
    tracing::info!("Search index built with {} meetings", meetings.len());

    // Create application state
    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone the signing secret for the auth layer
    let secret = state.config.jwt_secret.clone();

    // Routes behind the bearer-token guard
    let protected_routes = Router::new()
        // Auth
        .route("/auth/me", get(api::me))
        // Users
        .route("/users/search", get(api::search_users))
        .route("/users/me", put(api::update_me))
        // Meetings
        .route("/meetings", get(api::list_meetings))
        .route("/meetings", post(api::create_meeting))
        .route("/meetings/search", get(api::search_meetings))
        .route("/meetings/trash", get(api::list_trash))
        .route("/meetings/{id}", get(api::get_meeting))
        .route("/meetings/{id}", put(api::update_meeting))
        .route("/meetings/{id}", delete(api::delete_meeting))
        .route("/meetings/{id}/restore", post(api::restore_meeting))
        .route("/meetings/{id}/permanent", delete(api::permanent_delete_meeting))
        .route("/meetings/{id}/impact", get(api::get_impact))
        // Versions
        .route("/meetings/{id}/versions", get(api::list_versions))
        .route("/meetings/{id}/versions", post(api::create_version))
        .route(
            "/meetings/{id}/versions/{version_id}/restore",
            post(api::restore_version),
        )
        // Links
        .route("/meetings/{id}/links", get(api::get_links))
        .route("/meetings/{id}/links", post(api::create_link))
        .route("/meetings/{id}/links/{target_id}", delete(api::delete_link))
        // Participants
        .route("/meetings/{id}/participants", get(api::list_participants))
        .route("/meetings/{id}/participants", post(api::add_participant))
        .route(
            "/meetings/{id}/participants/{user_id}",
            delete(api::remove_participant),
        )
        // Permissions
        .route("/meetings/{id}/permissions", get(api::list_permissions))
        .route("/meetings/{id}/permissions", post(api::set_permission))
        .route(
            "/meetings/{id}/permissions/{permission_id}",
            delete(api::remove_permission),
        )
        // Action items
        .route("/meetings/{id}/action-items", get(api::list_action_items))
        .route("/meetings/{id}/action-items", post(api::create_action_item))
        .route("/action-items/{id}", put(api::update_action_item))
        .route("/action-items/{id}", delete(api::delete_action_item))
        // Templates
        .route("/templates", get(api::list_templates))
        .route("/templates", post(api::create_template))
        .route("/templates/{id}", get(api::get_template))
        .route("/templates/{id}", put(api::update_template))
        .route("/templates/{id}", delete(api::delete_template))
        // Projects
        .route("/projects", get(api::list_projects))
        .route("/projects", post(api::create_project))
        .route("/projects/trash", get(api::list_deleted_projects))
        .route("/projects/{id}", get(api::get_project))
        .route("/projects/{id}", put(api::update_project))
        .route("/projects/{id}", delete(api::delete_project))
        .route("/projects/{id}/restore", post(api::restore_project))
        // Teams
        .route("/teams", get(api::list_teams))
        .route("/teams", post(api::create_team))
        .route("/teams/{id}", get(api::get_team))
        .route("/teams/{id}", put(api::update_team))
        .route("/teams/{id}", delete(api::delete_team))
        .route("/teams/{id}/restore", post(api::restore_team))
        .route("/teams/{id}/members", get(api::get_team_members))
        .route("/teams/{id}/members", post(api::add_team_member))
        .route(
            "/teams/{id}/members/{user_id}",
            put(api::update_team_member_role),
        )
        .route(
            "/teams/{id}/members/{user_id}",
            delete(api::remove_team_member),
        )
        // Apply bearer-token auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::jwt_auth_layer(secret.clone(), req, next)
        }));

    // Registration and login stay outside the guard
    let public_routes = Router::new()
        .route("/auth/register", post(api::register))
        .route("/auth/login", post(api::login));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
