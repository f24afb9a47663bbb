//! Meeting document persistence.
//!
//! Meetings are soft-deleted into a trash with a fixed recovery window;
//! permanent deletion is a separate explicit operation that also removes
//! all satellite records.

use chrono::Utc;
use sqlx::Row;

use super::repository::{ensure_recoverable, parse_json_array, parse_json_value, Repository};
use crate::errors::AppError;
use crate::models::{AccessLevel, CreateMeetingRequest, Meeting, UpdateMeetingRequest};

const MEETING_COLUMNS: &str = "id, title, content, content_text, template_id, project_id, created_by, access_level, tags, created_at, updated_at, deleted_at";

impl Repository {
    /// List the caller's live meetings, newest update first.
    pub async fn list_meetings(&self, user_id: &str) -> Result<Vec<Meeting>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings
             WHERE created_by = ? AND deleted_at IS NULL
             ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(meeting_from_row).collect())
    }

    /// Get a live meeting by ID.
    pub async fn get_meeting(&self, id: &str) -> Result<Option<Meeting>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(meeting_from_row))
    }

    /// Get a live meeting or fail with not-found.
    pub async fn require_meeting(&self, id: &str) -> Result<Meeting, AppError> {
        self.get_meeting(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Meeting {} not found", id)))
    }

    /// Get a meeting regardless of trash state.
    pub async fn get_meeting_any(&self, id: &str) -> Result<Option<Meeting>, AppError> {
        let row = sqlx::query(&format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(meeting_from_row))
    }

    /// List every live meeting, used to rebuild the search index at
    /// startup.
    pub async fn list_all_meetings(&self) -> Result<Vec<Meeting>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE deleted_at IS NULL"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(meeting_from_row).collect())
    }

    /// Fetch live meetings by ID, preserving the input order. Used to
    /// resolve search hits.
    pub async fn meetings_by_ids(&self, ids: &[String]) -> Result<Vec<Meeting>, AppError> {
        let mut meetings = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(meeting) = self.get_meeting(id).await? {
                meetings.push(meeting);
            }
        }
        Ok(meetings)
    }

    /// Create a meeting. Teams named in the request are granted write
    /// permission on it in the same transaction.
    pub async fn create_meeting(
        &self,
        user_id: &str,
        request: &CreateMeetingRequest,
        content_text: Option<String>,
    ) -> Result<Meeting, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let content = request
            .content
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));
        let content_json = serde_json::to_string(&content)?;
        let access = request.access_level.unwrap_or(AccessLevel::Team);
        let tags_json = request
            .tags
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO meetings (id, title, content, content_text, template_id, project_id, created_by, access_level, tags, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.title)
        .bind(&content_json)
        .bind(&content_text)
        .bind(&request.template_id)
        .bind(&request.project_id)
        .bind(user_id)
        .bind(access.as_str())
        .bind(&tags_json)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if let Some(team_ids) = &request.team_ids {
            for team_id in team_ids {
                sqlx::query(
                    "INSERT INTO meeting_permissions (id, meeting_id, team_id, permission, created_at) VALUES (?, ?, ?, 'write', ?)"
                )
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(&id)
                .bind(team_id)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(Meeting {
            id,
            title: request.title.clone(),
            content,
            content_text,
            template_id: request.template_id.clone(),
            project_id: request.project_id.clone(),
            created_by: user_id.to_string(),
            access_level: access,
            tags: request.tags.clone(),
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Update a meeting. Absent fields are left unchanged; concurrent
    /// updates are last-write-wins. `text_override` carries the new
    /// plain-text mirror when the content changed.
    pub async fn update_meeting(
        &self,
        id: &str,
        request: &UpdateMeetingRequest,
        text_override: Option<String>,
    ) -> Result<Meeting, AppError> {
        let existing = self.require_meeting(id).await?;

        let title = request.title.as_ref().unwrap_or(&existing.title);
        let content = request.content.clone().unwrap_or(existing.content.clone());
        let content_text = text_override.or(existing.content_text.clone());
        let template_id = request.template_id.clone().or(existing.template_id.clone());
        let project_id = request.project_id.clone().or(existing.project_id.clone());
        let access = request.access_level.unwrap_or(existing.access_level);
        let tags = request.tags.clone().or(existing.tags.clone());
        let now = Utc::now().to_rfc3339();

        let content_json = serde_json::to_string(&content)?;
        let tags_json = tags.as_ref().map(serde_json::to_string).transpose()?;

        sqlx::query(
            "UPDATE meetings SET title = ?, content = ?, content_text = ?, template_id = ?, project_id = ?, access_level = ?, tags = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL"
        )
        .bind(title)
        .bind(&content_json)
        .bind(&content_text)
        .bind(&template_id)
        .bind(&project_id)
        .bind(access.as_str())
        .bind(&tags_json)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(Meeting {
            id: id.to_string(),
            title: title.clone(),
            content,
            content_text,
            template_id,
            project_id,
            created_by: existing.created_by,
            access_level: access,
            tags,
            created_at: existing.created_at,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Overwrite a meeting's content, used when restoring a version
    /// snapshot.
    pub async fn set_meeting_content(
        &self,
        id: &str,
        content: &serde_json::Value,
        content_text: &str,
    ) -> Result<Meeting, AppError> {
        let content_json = serde_json::to_string(content)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE meetings SET content = ?, content_text = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL"
        )
        .bind(&content_json)
        .bind(content_text)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Meeting {} not found", id)));
        }

        self.require_meeting(id).await
    }

    /// Move a meeting to the trash.
    pub async fn soft_delete_meeting(&self, id: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let result =
            sqlx::query("UPDATE meetings SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Meeting {} not found", id)));
        }
        Ok(())
    }

    /// Restore a trashed meeting within the recovery window.
    pub async fn restore_meeting(&self, id: &str) -> Result<Meeting, AppError> {
        let meeting = self
            .get_meeting_any(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Meeting {} not found", id)))?;

        let deleted_at = meeting
            .deleted_at
            .ok_or_else(|| AppError::Conflict(format!("Meeting {} is not in the trash", id)))?;
        ensure_recoverable(&deleted_at)?;

        sqlx::query("UPDATE meetings SET deleted_at = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.require_meeting(id).await
    }

    /// List the caller's trashed meetings, most recently deleted first.
    pub async fn list_deleted_meetings(&self, user_id: &str) -> Result<Vec<Meeting>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings
             WHERE created_by = ? AND deleted_at IS NOT NULL
             ORDER BY deleted_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(meeting_from_row).collect())
    }

    /// Permanently delete a meeting and all its satellite records.
    pub async fn permanent_delete_meeting(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM meetings WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Meeting {} not found", id)));
        }

        sqlx::query("DELETE FROM meeting_versions WHERE meeting_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "DELETE FROM meeting_links WHERE source_meeting_id = ? OR target_meeting_id = ?",
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM meeting_permissions WHERE meeting_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM meeting_participants WHERE meeting_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM action_items WHERE meeting_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

pub(super) fn meeting_from_row(row: &sqlx::sqlite::SqliteRow) -> Meeting {
    let content: String = row.get("content");
    let tags: Option<String> = row.get("tags");
    let access: String = row.get("access_level");

    Meeting {
        id: row.get("id"),
        title: row.get("title"),
        content: parse_json_value(&content),
        content_text: row.get("content_text"),
        template_id: row.get("template_id"),
        project_id: row.get("project_id"),
        created_by: row.get("created_by"),
        access_level: AccessLevel::from_str(&access).unwrap_or(AccessLevel::Team),
        tags: tags.map(|s| parse_json_array(&s)),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}
