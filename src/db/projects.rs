//! Project persistence.

use chrono::Utc;
use sqlx::Row;

use super::repository::{ensure_recoverable, Repository};
use crate::errors::AppError;
use crate::models::{
    AccessLevel, CreateProjectRequest, MeetingSummary, Project, UpdateProjectRequest,
};

const PROJECT_COLUMNS: &str =
    "id, name, description, team_id, owner_id, default_access_level, created_at, updated_at, deleted_at";

impl Repository {
    /// List live projects, newest update first.
    pub async fn list_projects(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE deleted_at IS NULL ORDER BY updated_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    /// List soft-deleted projects.
    pub async fn list_deleted_projects(&self) -> Result<Vec<Project>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE deleted_at IS NOT NULL ORDER BY deleted_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(project_from_row).collect())
    }

    /// Get a live project with its live meetings.
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut project = project_from_row(&row);

        let meeting_rows = sqlx::query(
            "SELECT id, title FROM meetings WHERE project_id = ? AND deleted_at IS NULL ORDER BY updated_at DESC"
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        project.meetings = Some(
            meeting_rows
                .iter()
                .map(|row| MeetingSummary {
                    id: row.get("id"),
                    title: row.get("title"),
                })
                .collect(),
        );

        Ok(Some(project))
    }

    /// Create a project owned by the caller.
    pub async fn create_project(
        &self,
        owner_id: &str,
        request: &CreateProjectRequest,
    ) -> Result<Project, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let access = request.default_access_level.unwrap_or(AccessLevel::Team);

        sqlx::query(
            "INSERT INTO projects (id, name, description, team_id, owner_id, default_access_level, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(&request.team_id)
        .bind(owner_id)
        .bind(access.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Project {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            team_id: request.team_id.clone(),
            owner_id: owner_id.to_string(),
            default_access_level: access,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
            meetings: None,
        })
    }

    /// Update a project's mutable fields.
    pub async fn update_project(
        &self,
        id: &str,
        request: &UpdateProjectRequest,
    ) -> Result<Project, AppError> {
        let existing = self
            .get_project(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?;

        let name = request
            .name
            .clone()
            .unwrap_or_else(|| existing.name.clone());
        let description = request.description.clone().or(existing.description.clone());
        let team_id = request.team_id.clone().or(existing.team_id.clone());
        let access = request
            .default_access_level
            .unwrap_or(existing.default_access_level);
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE projects SET name = ?, description = ?, team_id = ?, default_access_level = ?, updated_at = ? WHERE id = ?"
        )
        .bind(&name)
        .bind(&description)
        .bind(&team_id)
        .bind(access.as_str())
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Project {
            name,
            description,
            team_id,
            default_access_level: access,
            updated_at: now,
            meetings: None,
            ..existing
        })
    }

    /// Soft-delete a project.
    pub async fn soft_delete_project(&self, id: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let result =
            sqlx::query("UPDATE projects SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Project {} not found", id)));
        }
        Ok(())
    }

    /// Restore a soft-deleted project within the recovery window.
    pub async fn restore_project(&self, id: &str) -> Result<Project, AppError> {
        let row = sqlx::query("SELECT deleted_at FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let deleted_at: Option<String> = row
            .ok_or_else(|| AppError::NotFound(format!("Project {} not found", id)))?
            .get("deleted_at");
        let deleted_at = deleted_at
            .ok_or_else(|| AppError::Conflict(format!("Project {} is not in the trash", id)))?;
        ensure_recoverable(&deleted_at)?;

        sqlx::query("UPDATE projects SET deleted_at = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_project(id)
            .await?
            .ok_or_else(|| AppError::Internal("Project vanished after restore".to_string()))
    }
}

fn project_from_row(row: &sqlx::sqlite::SqliteRow) -> Project {
    let access: String = row.get("default_access_level");
    Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        team_id: row.get("team_id"),
        owner_id: row.get("owner_id"),
        default_access_level: AccessLevel::from_str(&access).unwrap_or(AccessLevel::Team),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
        meetings: None,
    }
}
