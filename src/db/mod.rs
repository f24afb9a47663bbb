//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data. Soft-deletable
//! tables carry a nullable `deleted_at`; every default query filters it
//! out, and only explicit trash queries see it.

mod meeting_extras;
mod meetings;
mod projects;
mod repository;
mod teams;
mod users;

pub use repository::{recovery_deadline, Repository};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Days a soft-deleted row stays recoverable.
pub const TRASH_RETENTION_DAYS: i64 = 30;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'member',
            status TEXT NOT NULL DEFAULT 'active',
            profile_image TEXT,
            last_login_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            leader_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );

        CREATE TABLE IF NOT EXISTS team_members (
            id TEXT PRIMARY KEY,
            team_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'member',
            joined_at TEXT NOT NULL,
            UNIQUE (team_id, user_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            team_id TEXT,
            owner_id TEXT NOT NULL,
            default_access_level TEXT NOT NULL DEFAULT 'team',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meetings (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            content_text TEXT,
            template_id TEXT,
            project_id TEXT,
            created_by TEXT NOT NULL,
            access_level TEXT NOT NULL DEFAULT 'team',
            tags TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meeting_versions (
            id TEXT PRIMARY KEY,
            meeting_id TEXT NOT NULL,
            content TEXT NOT NULL,
            version INTEGER NOT NULL,
            created_by TEXT NOT NULL,
            change_description TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (meeting_id, version)
        );

        CREATE TABLE IF NOT EXISTS meeting_links (
            id TEXT PRIMARY KEY,
            source_meeting_id TEXT NOT NULL,
            target_meeting_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE (source_meeting_id, target_meeting_id)
        );

        CREATE TABLE IF NOT EXISTS meeting_permissions (
            id TEXT PRIMARY KEY,
            meeting_id TEXT NOT NULL,
            user_id TEXT,
            team_id TEXT,
            permission TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meeting_participants (
            id TEXT PRIMARY KEY,
            meeting_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'participant',
            UNIQUE (meeting_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS action_items (
            id TEXT PRIMARY KEY,
            meeting_id TEXT NOT NULL,
            assignee_id TEXT,
            description TEXT NOT NULL,
            due_date TEXT,
            completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS templates (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            content TEXT NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            created_by TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for common queries
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_meetings_created_by ON meetings(created_by);
        CREATE INDEX IF NOT EXISTS idx_meetings_updated_at ON meetings(updated_at);
        CREATE INDEX IF NOT EXISTS idx_meetings_project_id ON meetings(project_id);
        CREATE INDEX IF NOT EXISTS idx_meeting_versions_meeting_id ON meeting_versions(meeting_id);
        CREATE INDEX IF NOT EXISTS idx_meeting_links_source ON meeting_links(source_meeting_id);
        CREATE INDEX IF NOT EXISTS idx_meeting_links_target ON meeting_links(target_meeting_id);
        CREATE INDEX IF NOT EXISTS idx_meeting_permissions_meeting_id ON meeting_permissions(meeting_id);
        CREATE INDEX IF NOT EXISTS idx_meeting_participants_meeting_id ON meeting_participants(meeting_id);
        CREATE INDEX IF NOT EXISTS idx_action_items_meeting_id ON action_items(meeting_id);
        CREATE INDEX IF NOT EXISTS idx_projects_updated_at ON projects(updated_at);
        CREATE INDEX IF NOT EXISTS idx_team_members_team_id ON team_members(team_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
