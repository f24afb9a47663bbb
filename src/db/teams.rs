//! Team and membership persistence.

use chrono::Utc;
use sqlx::Row;

use super::repository::{ensure_recoverable, Repository};
use crate::errors::AppError;
use crate::models::{
    CreateTeamRequest, Team, TeamMember, TeamRole, UpdateTeamRequest, UserSummary,
};

impl Repository {
    /// List live teams, newest first, with leader and member roster.
    pub async fn list_teams(&self) -> Result<Vec<Team>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, description, leader_id, created_at, updated_at FROM teams
             WHERE deleted_at IS NULL ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut teams = Vec::with_capacity(rows.len());
        for row in &rows {
            teams.push(self.hydrate_team(row).await?);
        }
        Ok(teams)
    }

    /// Get a live team by ID with leader and member roster.
    pub async fn get_team(&self, id: &str) -> Result<Option<Team>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, description, leader_id, created_at, updated_at FROM teams
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_team(&row).await?)),
            None => Ok(None),
        }
    }

    /// Create a team. The creator becomes the leader and is added to the
    /// roster with the `leader` role.
    pub async fn create_team(
        &self,
        leader_id: &str,
        request: &CreateTeamRequest,
    ) -> Result<Team, AppError> {
        let team_id = uuid::Uuid::new_v4().to_string();
        let member_id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO teams (id, name, description, leader_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&team_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(leader_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO team_members (id, team_id, user_id, role, joined_at) VALUES (?, ?, ?, 'leader', ?)"
        )
        .bind(&member_id)
        .bind(&team_id)
        .bind(leader_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_team(&team_id)
            .await?
            .ok_or_else(|| AppError::Internal("Team vanished after insert".to_string()))
    }

    /// Update a team's mutable fields.
    pub async fn update_team(
        &self,
        id: &str,
        request: &UpdateTeamRequest,
    ) -> Result<Team, AppError> {
        let existing = self
            .get_team(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))?;

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let description = request.description.clone().or(existing.description.clone());
        let leader_id = request.leader_id.clone().or(existing.leader_id.clone());
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE teams SET name = ?, description = ?, leader_id = ?, updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(&description)
        .bind(&leader_id)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_team(id)
            .await?
            .ok_or_else(|| AppError::Internal("Team vanished after update".to_string()))
    }

    /// Soft-delete a team.
    pub async fn soft_delete_team(&self, id: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let result =
            sqlx::query("UPDATE teams SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Team {} not found", id)));
        }
        Ok(())
    }

    /// Restore a soft-deleted team within the recovery window.
    pub async fn restore_team(&self, id: &str) -> Result<Team, AppError> {
        let row = sqlx::query("SELECT deleted_at FROM teams WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let deleted_at: Option<String> = row
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))?
            .get("deleted_at");
        let deleted_at = deleted_at
            .ok_or_else(|| AppError::Conflict(format!("Team {} is not in the trash", id)))?;
        ensure_recoverable(&deleted_at)?;

        sqlx::query("UPDATE teams SET deleted_at = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_team(id)
            .await?
            .ok_or_else(|| AppError::Internal("Team vanished after restore".to_string()))
    }

    // ==================== TEAM MEMBERS ====================

    /// List a team's members with embedded user summaries.
    pub async fn get_team_members(&self, team_id: &str) -> Result<Vec<TeamMember>, AppError> {
        let rows = sqlx::query(
            "SELECT tm.id, tm.team_id, tm.user_id, tm.role, tm.joined_at,
                    u.name AS user_name, u.email AS user_email
             FROM team_members tm
             JOIN users u ON u.id = tm.user_id
             WHERE tm.team_id = ?
             ORDER BY tm.joined_at",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(team_member_from_row).collect())
    }

    /// Add a user to a team's roster.
    pub async fn add_team_member(
        &self,
        team_id: &str,
        user_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, AppError> {
        if self.get_team(team_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Team {} not found", team_id)));
        }
        if self.get_user(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let existing = sqlx::query("SELECT id FROM team_members WHERE team_id = ? AND user_id = ?")
            .bind(team_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "User is already a member of this team".to_string(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO team_members (id, team_id, user_id, role, joined_at) VALUES (?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(team_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user = self.get_user_summary(user_id).await?;
        Ok(TeamMember {
            id,
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
            role,
            joined_at: now,
            user,
        })
    }

    /// Remove a user from a team's roster.
    pub async fn remove_team_member(&self, team_id: &str, user_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = ? AND user_id = ?")
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Team member not found".to_string()));
        }
        Ok(())
    }

    /// Change a member's role within a team.
    pub async fn update_team_member_role(
        &self,
        team_id: &str,
        user_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, AppError> {
        let result = sqlx::query("UPDATE team_members SET role = ? WHERE team_id = ? AND user_id = ?")
            .bind(role.as_str())
            .bind(team_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Team member not found".to_string()));
        }

        let row = sqlx::query(
            "SELECT tm.id, tm.team_id, tm.user_id, tm.role, tm.joined_at,
                    u.name AS user_name, u.email AS user_email
             FROM team_members tm
             JOIN users u ON u.id = tm.user_id
             WHERE tm.team_id = ? AND tm.user_id = ?",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(team_member_from_row(&row))
    }

    /// Attach leader summary and member roster to a raw team row.
    async fn hydrate_team(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Team, AppError> {
        let id: String = row.get("id");
        let leader_id: Option<String> = row.get("leader_id");

        let leader = match &leader_id {
            Some(leader_id) => self.get_user_summary(leader_id).await?,
            None => None,
        };
        let members = self.get_team_members(&id).await?;

        Ok(Team {
            id,
            name: row.get("name"),
            description: row.get("description"),
            leader_id,
            leader,
            members,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

fn team_member_from_row(row: &sqlx::sqlite::SqliteRow) -> TeamMember {
    let role: String = row.get("role");
    TeamMember {
        id: row.get("id"),
        team_id: row.get("team_id"),
        user_id: row.get("user_id"),
        role: TeamRole::from_str(&role).unwrap_or(TeamRole::Member),
        joined_at: row.get("joined_at"),
        user: Some(UserSummary {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("user_email"),
        }),
    }
}
