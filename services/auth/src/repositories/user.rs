//! User repository for database operations

use async_trait::async_trait;
use common::error::DatabaseError;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;

use super::{StoreError, StoreResult, UserStore};
use crate::models::{LockoutState, NewUser, Role, UpdateUser, User};

const USER_COLUMNS: &str = "id, username, password_hash, name, email, phone, role, \
     failed_login_attempts, blocked, disabled, created_at, updated_at";

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role: String = row.try_get("role").map_err(DatabaseError::Query)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| StoreError::Corrupt(e.to_string()))?;

    Ok(User {
        id: row.try_get("id").map_err(DatabaseError::Query)?,
        username: row.try_get("username").map_err(DatabaseError::Query)?,
        password_hash: row.try_get("password_hash").map_err(DatabaseError::Query)?,
        name: row.try_get("name").map_err(DatabaseError::Query)?,
        email: row.try_get("email").map_err(DatabaseError::Query)?,
        phone: row.try_get("phone").map_err(DatabaseError::Query)?,
        role,
        failed_login_attempts: row
            .try_get("failed_login_attempts")
            .map_err(DatabaseError::Query)?,
        blocked: row.try_get("blocked").map_err(DatabaseError::Query)?,
        disabled: row.try_get("disabled").map_err(DatabaseError::Query)?,
        created_at: row.try_get("created_at").map_err(DatabaseError::Query)?,
        updated_at: row.try_get("updated_at").map_err(DatabaseError::Query)?,
    })
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn record_failed_login(&self, id: i32, threshold: i32) -> StoreResult<LockoutState> {
        // SET expressions see the pre-update row, so both columns derive from the same value.
        let row = sqlx::query(
            r#"
            UPDATE users
            SET failed_login_attempts = failed_login_attempts + 1,
                blocked = blocked OR failed_login_attempts + 1 >= $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING failed_login_attempts, blocked
            "#,
        )
        .bind(id)
        .bind(threshold)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(LockoutState {
            failed_login_attempts: row
                .try_get("failed_login_attempts")
                .map_err(DatabaseError::Query)?,
            blocked: row.try_get("blocked").map_err(DatabaseError::Query)?,
        })
    }

    async fn reset_login_state(&self, id: i32) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET failed_login_attempts = 0, updated_at = NOW()
            WHERE id = $1 AND NOT disabled AND NOT blocked
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, new_user: &NewUser) -> StoreResult<User> {
        info!(username = %new_user.username, role = %new_user.role, "Creating new user");

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, password_hash, name, email, phone, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.phone)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let err = DatabaseError::Query(e);
            if err.is_unique_violation() {
                StoreError::DuplicateUsername(new_user.username.clone())
            } else {
                StoreError::Database(err)
            }
        })?;

        user_from_row(&row)
    }

    async fn update(&self, id: i32, changes: &UpdateUser) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = CASE WHEN $4::TEXT IS NULL THEN phone ELSE NULLIF($4, '') END,
                role = COALESCE($5, role),
                disabled = COALESCE($6, disabled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(changes.role.map(|role| role.as_str()))
        .bind(changes.disabled)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn unlock(&self, id: i32) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET failed_login_attempts = 0, blocked = FALSE, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(common::database::health_check(&self.pool).await?)
    }
}
