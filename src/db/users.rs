//! User account persistence.

use chrono::Utc;
use sqlx::Row;

use super::repository::Repository;
use crate::errors::AppError;
use crate::models::{UpdateProfileRequest, User, UserRole, UserStatus, UserSummary};

const USER_COLUMNS: &str = "id, email, name, role, status, profile_image, last_login_at, created_at, updated_at";

impl Repository {
    /// Create a user account. The caller provides a pre-hashed password.
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "User with email {} already exists",
                email
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash, role, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(UserStatus::Active.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role,
            status: UserStatus::Active,
            profile_image: None,
            last_login_at: None,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Look up a user by email.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Look up a user and its password hash for credential checks.
    pub async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ? AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .as_ref()
            .map(|row| (user_from_row(row), row.get("password_hash"))))
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Stamp a successful login.
    pub async fn update_last_login(&self, id: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Substring search over user names and emails.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>, AppError> {
        let pattern = format!("%{}%", query.to_lowercase());
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE deleted_at IS NULL AND (lower(name) LIKE ? OR lower(email) LIKE ?)
             ORDER BY name LIMIT 50"
        ))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Update a user's own profile fields.
    pub async fn update_profile(
        &self,
        id: &str,
        request: &UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let name = request
            .name
            .clone()
            .unwrap_or_else(|| existing.name.clone());
        let profile_image = request
            .profile_image
            .clone()
            .or(existing.profile_image.clone());
        let now = Utc::now().to_rfc3339();

        sqlx::query("UPDATE users SET name = ?, profile_image = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(&profile_image)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(User {
            name,
            profile_image,
            updated_at: now,
            ..existing
        })
    }

    /// Compact summary for embedding into other resources.
    pub async fn get_user_summary(&self, id: &str) -> Result<Option<UserSummary>, AppError> {
        let row =
            sqlx::query("SELECT id, name, email FROM users WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| UserSummary {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
        }))
    }
}

pub(super) fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    let status: String = row.get("status");
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        role: UserRole::from_str(&role).unwrap_or(UserRole::Member),
        status: UserStatus::from_str(&status).unwrap_or(UserStatus::Active),
        profile_image: row.get("profile_image"),
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
