//! Persistence for meeting satellite records: versions, links,
//! permissions, participants, action items, and templates.

use chrono::Utc;
use sqlx::Row;

use super::repository::{parse_json_value, Repository};
use crate::errors::AppError;
use crate::models::{
    ActionItem, CreateActionItemRequest, CreateTemplateRequest, LinkEndpoint, MeetingLink,
    MeetingLinks, MeetingParticipant, MeetingPermission, MeetingSummary, MeetingVersion,
    ParticipantRole, PermissionLevel, SetPermissionRequest, Template, UpdateActionItemRequest,
    UpdateTemplateRequest, UserSummary,
};

impl Repository {
    // ==================== VERSIONS ====================

    /// Snapshot a meeting's content. Version numbers are assigned
    /// `max(existing) + 1` per meeting inside a transaction.
    pub async fn create_version(
        &self,
        meeting_id: &str,
        content: &serde_json::Value,
        user_id: &str,
        description: Option<&str>,
    ) -> Result<MeetingVersion, AppError> {
        self.require_meeting(meeting_id).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let content_json = serde_json::to_string(content)?;

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT COALESCE(MAX(version), 0) AS latest FROM meeting_versions WHERE meeting_id = ?",
        )
        .bind(meeting_id)
        .fetch_one(&mut *tx)
        .await?;
        let next_version: i64 = row.get::<i64, _>("latest") + 1;

        sqlx::query(
            "INSERT INTO meeting_versions (id, meeting_id, content, version, created_by, change_description, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(meeting_id)
        .bind(&content_json)
        .bind(next_version)
        .bind(user_id)
        .bind(description)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MeetingVersion {
            id,
            meeting_id: meeting_id.to_string(),
            content: content.clone(),
            version: next_version,
            created_by: user_id.to_string(),
            change_description: description.map(|s| s.to_string()),
            created_at: now,
        })
    }

    /// List a meeting's versions, newest first.
    pub async fn list_versions(&self, meeting_id: &str) -> Result<Vec<MeetingVersion>, AppError> {
        self.require_meeting(meeting_id).await?;

        let rows = sqlx::query(
            "SELECT id, meeting_id, content, version, created_by, change_description, created_at
             FROM meeting_versions WHERE meeting_id = ? ORDER BY version DESC",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(version_from_row).collect())
    }

    /// Get one version of a meeting.
    pub async fn get_version(
        &self,
        meeting_id: &str,
        version_id: &str,
    ) -> Result<Option<MeetingVersion>, AppError> {
        let row = sqlx::query(
            "SELECT id, meeting_id, content, version, created_by, change_description, created_at
             FROM meeting_versions WHERE id = ? AND meeting_id = ?",
        )
        .bind(version_id)
        .bind(meeting_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(version_from_row))
    }

    // ==================== LINKS ====================

    /// Create a directed link between two live meetings. The ordered pair
    /// must be unique.
    pub async fn create_link(
        &self,
        source_meeting_id: &str,
        target_meeting_id: &str,
    ) -> Result<MeetingLink, AppError> {
        self.require_meeting(source_meeting_id).await?;
        if self.get_meeting(target_meeting_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "Target meeting {} not found",
                target_meeting_id
            )));
        }

        let existing = sqlx::query(
            "SELECT id FROM meeting_links WHERE source_meeting_id = ? AND target_meeting_id = ?",
        )
        .bind(source_meeting_id)
        .bind(target_meeting_id)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "These meetings are already linked".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO meeting_links (id, source_meeting_id, target_meeting_id, created_at) VALUES (?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(source_meeting_id)
        .bind(target_meeting_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(MeetingLink {
            id,
            source_meeting_id: source_meeting_id.to_string(),
            target_meeting_id: target_meeting_id.to_string(),
            created_at: now,
        })
    }

    /// Remove a link edge.
    pub async fn delete_link(
        &self,
        source_meeting_id: &str,
        target_meeting_id: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "DELETE FROM meeting_links WHERE source_meeting_id = ? AND target_meeting_id = ?",
        )
        .bind(source_meeting_id)
        .bind(target_meeting_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Link not found".to_string()));
        }
        Ok(())
    }

    /// Outbound and inbound edges of a meeting, with the live meeting on
    /// the other side of each edge.
    pub async fn get_links(&self, meeting_id: &str) -> Result<MeetingLinks, AppError> {
        self.require_meeting(meeting_id).await?;

        let outbound = sqlx::query(
            "SELECT l.id, m.id AS meeting_id, m.title
             FROM meeting_links l
             JOIN meetings m ON m.id = l.target_meeting_id
             WHERE l.source_meeting_id = ? AND m.deleted_at IS NULL",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        let inbound = sqlx::query(
            "SELECT l.id, m.id AS meeting_id, m.title
             FROM meeting_links l
             JOIN meetings m ON m.id = l.source_meeting_id
             WHERE l.target_meeting_id = ? AND m.deleted_at IS NULL",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(MeetingLinks {
            outbound: outbound.iter().map(link_endpoint_from_row).collect(),
            inbound: inbound.iter().map(link_endpoint_from_row).collect(),
        })
    }

    /// Inverse link lookup: which live meetings link to this one.
    pub async fn get_impact(&self, meeting_id: &str) -> Result<Vec<MeetingSummary>, AppError> {
        self.require_meeting(meeting_id).await?;

        let rows = sqlx::query(
            "SELECT m.id, m.title
             FROM meeting_links l
             JOIN meetings m ON m.id = l.source_meeting_id
             WHERE l.target_meeting_id = ? AND m.deleted_at IS NULL",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| MeetingSummary {
                id: row.get("id"),
                title: row.get("title"),
            })
            .collect())
    }

    // ==================== PERMISSIONS ====================

    /// Grant access on a meeting to a user or a team.
    pub async fn set_permission(
        &self,
        meeting_id: &str,
        request: &SetPermissionRequest,
    ) -> Result<MeetingPermission, AppError> {
        self.require_meeting(meeting_id).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO meeting_permissions (id, meeting_id, user_id, team_id, permission, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(meeting_id)
        .bind(&request.user_id)
        .bind(&request.team_id)
        .bind(request.permission.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(MeetingPermission {
            id,
            meeting_id: meeting_id.to_string(),
            user_id: request.user_id.clone(),
            team_id: request.team_id.clone(),
            permission: request.permission,
            created_at: now,
        })
    }

    /// Revoke a grant.
    pub async fn remove_permission(
        &self,
        meeting_id: &str,
        permission_id: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM meeting_permissions WHERE id = ? AND meeting_id = ?")
            .bind(permission_id)
            .bind(meeting_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Permission not found".to_string()));
        }
        Ok(())
    }

    /// The flat grant list of a meeting.
    pub async fn list_permissions(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<MeetingPermission>, AppError> {
        self.require_meeting(meeting_id).await?;

        let rows = sqlx::query(
            "SELECT id, meeting_id, user_id, team_id, permission, created_at
             FROM meeting_permissions WHERE meeting_id = ? ORDER BY created_at",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let permission: String = row.get("permission");
                MeetingPermission {
                    id: row.get("id"),
                    meeting_id: row.get("meeting_id"),
                    user_id: row.get("user_id"),
                    team_id: row.get("team_id"),
                    permission: PermissionLevel::from_str(&permission)
                        .unwrap_or(PermissionLevel::Read),
                    created_at: row.get("created_at"),
                }
            })
            .collect())
    }

    // ==================== PARTICIPANTS ====================

    /// Attach a user to a meeting.
    pub async fn add_participant(
        &self,
        meeting_id: &str,
        user_id: &str,
        role: ParticipantRole,
    ) -> Result<MeetingParticipant, AppError> {
        self.require_meeting(meeting_id).await?;
        if self.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let existing =
            sqlx::query("SELECT id FROM meeting_participants WHERE meeting_id = ? AND user_id = ?")
                .bind(meeting_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "User is already a participant".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO meeting_participants (id, meeting_id, user_id, role) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(meeting_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        let user = self.get_user_summary(user_id).await?;
        Ok(MeetingParticipant {
            id,
            meeting_id: meeting_id.to_string(),
            user_id: user_id.to_string(),
            role,
            user,
        })
    }

    /// Detach a user from a meeting.
    pub async fn remove_participant(
        &self,
        meeting_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("DELETE FROM meeting_participants WHERE meeting_id = ? AND user_id = ?")
                .bind(meeting_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Participant not found".to_string()));
        }
        Ok(())
    }

    /// List a meeting's participants with embedded user summaries.
    pub async fn list_participants(
        &self,
        meeting_id: &str,
    ) -> Result<Vec<MeetingParticipant>, AppError> {
        self.require_meeting(meeting_id).await?;

        let rows = sqlx::query(
            "SELECT p.id, p.meeting_id, p.user_id, p.role,
                    u.name AS user_name, u.email AS user_email
             FROM meeting_participants p
             JOIN users u ON u.id = p.user_id
             WHERE p.meeting_id = ?
             ORDER BY u.name",
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let role: String = row.get("role");
                MeetingParticipant {
                    id: row.get("id"),
                    meeting_id: row.get("meeting_id"),
                    user_id: row.get("user_id"),
                    role: ParticipantRole::from_str(&role).unwrap_or(ParticipantRole::Participant),
                    user: Some(UserSummary {
                        id: row.get("user_id"),
                        name: row.get("user_name"),
                        email: row.get("user_email"),
                    }),
                }
            })
            .collect())
    }

    // ==================== ACTION ITEMS ====================

    /// Create an action item on a meeting.
    pub async fn create_action_item(
        &self,
        meeting_id: &str,
        request: &CreateActionItemRequest,
    ) -> Result<ActionItem, AppError> {
        self.require_meeting(meeting_id).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO action_items (id, meeting_id, assignee_id, description, due_date, completed, created_at) VALUES (?, ?, ?, ?, ?, 0, ?)"
        )
        .bind(&id)
        .bind(meeting_id)
        .bind(&request.assignee_id)
        .bind(&request.description)
        .bind(&request.due_date)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(ActionItem {
            id,
            meeting_id: meeting_id.to_string(),
            assignee_id: request.assignee_id.clone(),
            description: request.description.clone(),
            due_date: request.due_date.clone(),
            completed: false,
            completed_at: None,
            created_at: now,
        })
    }

    /// Get an action item by ID.
    pub async fn get_action_item(&self, id: &str) -> Result<Option<ActionItem>, AppError> {
        let row = sqlx::query(
            "SELECT id, meeting_id, assignee_id, description, due_date, completed, completed_at, created_at
             FROM action_items WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(action_item_from_row))
    }

    /// Update an action item. Completing stamps `completed_at`;
    /// un-completing clears it.
    pub async fn update_action_item(
        &self,
        id: &str,
        request: &UpdateActionItemRequest,
    ) -> Result<ActionItem, AppError> {
        let existing = self
            .get_action_item(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Action item {} not found", id)))?;

        let description = request.description.as_ref().unwrap_or(&existing.description);
        let assignee_id = request.assignee_id.clone().or(existing.assignee_id.clone());
        let due_date = request.due_date.clone().or(existing.due_date.clone());
        let completed = request.completed.unwrap_or(existing.completed);
        let completed_at = match (completed, existing.completed) {
            (true, false) => Some(Utc::now().to_rfc3339()),
            (true, true) => existing.completed_at.clone(),
            (false, _) => None,
        };

        sqlx::query(
            "UPDATE action_items SET description = ?, assignee_id = ?, due_date = ?, completed = ?, completed_at = ? WHERE id = ?"
        )
        .bind(description)
        .bind(&assignee_id)
        .bind(&due_date)
        .bind(completed as i32)
        .bind(&completed_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(ActionItem {
            id: id.to_string(),
            meeting_id: existing.meeting_id,
            assignee_id,
            description: description.clone(),
            due_date,
            completed,
            completed_at,
            created_at: existing.created_at,
        })
    }

    /// Delete an action item.
    pub async fn delete_action_item(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM action_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Action item {} not found", id)));
        }
        Ok(())
    }

    /// List a meeting's action items, oldest first.
    pub async fn list_action_items(&self, meeting_id: &str) -> Result<Vec<ActionItem>, AppError> {
        self.require_meeting(meeting_id).await?;

        let rows = sqlx::query(
            "SELECT id, meeting_id, assignee_id, description, due_date, completed, completed_at, created_at
             FROM action_items WHERE meeting_id = ? ORDER BY created_at"
        )
        .bind(meeting_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(action_item_from_row).collect())
    }

    // ==================== TEMPLATES ====================

    /// Create a meeting template.
    pub async fn create_template(
        &self,
        user_id: &str,
        request: &CreateTemplateRequest,
    ) -> Result<Template, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let content_json = serde_json::to_string(&request.content)?;
        let is_default = request.is_default.unwrap_or(false);

        sqlx::query(
            "INSERT INTO templates (id, name, content, is_default, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&content_json)
        .bind(is_default as i32)
        .bind(user_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(Template {
            id,
            name: request.name.clone(),
            content: request.content.clone(),
            is_default,
            created_by: Some(user_id.to_string()),
            created_at: now,
        })
    }

    /// Get a template by ID.
    pub async fn get_template(&self, id: &str) -> Result<Option<Template>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, content, is_default, created_by, created_at FROM templates WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(template_from_row))
    }

    /// Update a template.
    pub async fn update_template(
        &self,
        id: &str,
        request: &UpdateTemplateRequest,
    ) -> Result<Template, AppError> {
        let existing = self
            .get_template(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Template {} not found", id)))?;

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let content = request.content.clone().unwrap_or(existing.content.clone());
        let is_default = request.is_default.unwrap_or(existing.is_default);
        let content_json = serde_json::to_string(&content)?;

        sqlx::query("UPDATE templates SET name = ?, content = ?, is_default = ? WHERE id = ?")
            .bind(name)
            .bind(&content_json)
            .bind(is_default as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Template {
            id: id.to_string(),
            name: name.clone(),
            content,
            is_default,
            created_by: existing.created_by,
            created_at: existing.created_at,
        })
    }

    /// Delete a template.
    pub async fn delete_template(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Template {} not found", id)));
        }
        Ok(())
    }

    /// List templates, newest first.
    pub async fn list_templates(&self) -> Result<Vec<Template>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, content, is_default, created_by, created_at
             FROM templates ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(template_from_row).collect())
    }
}

fn version_from_row(row: &sqlx::sqlite::SqliteRow) -> MeetingVersion {
    let content: String = row.get("content");
    MeetingVersion {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        content: parse_json_value(&content),
        version: row.get("version"),
        created_by: row.get("created_by"),
        change_description: row.get("change_description"),
        created_at: row.get("created_at"),
    }
}

fn link_endpoint_from_row(row: &sqlx::sqlite::SqliteRow) -> LinkEndpoint {
    LinkEndpoint {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        title: row.get("title"),
    }
}

fn action_item_from_row(row: &sqlx::sqlite::SqliteRow) -> ActionItem {
    let completed: i32 = row.get("completed");
    ActionItem {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        assignee_id: row.get("assignee_id"),
        description: row.get("description"),
        due_date: row.get("due_date"),
        completed: completed != 0,
        completed_at: row.get("completed_at"),
        created_at: row.get("created_at"),
    }
}

fn template_from_row(row: &sqlx::sqlite::SqliteRow) -> Template {
    let content: String = row.get("content");
    let is_default: i32 = row.get("is_default");
    Template {
        id: row.get("id"),
        name: row.get("name"),
        content: parse_json_value(&content),
        is_default: is_default != 0,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    }
}
