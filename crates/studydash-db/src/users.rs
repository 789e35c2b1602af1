//! User repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use studydash_core::{
    Error, NewUser, ProfileUpdate, Result, User, UserCredentials, UserRepository,
};

const USER_COLUMNS: &str = "id, email, name, student_id, department, avatar, created_at";

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        student_id: row.get("student_id"),
        department: row.get("department"),
        avatar: row.get("avatar"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {}, password_hash FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| UserCredentials {
            user: user_from_row(&row),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let id = Uuid::now_v7();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, name, student_id, department, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.student_id)
        .bind(&user.department)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::Conflict("An account with this email already exists".to_string())
            }
            other => Error::Database(other),
        })?;

        info!(
            subsystem = "db",
            component = "users",
            op = "create",
            user_id = %id,
            "User created"
        );
        Ok(user_from_row(&row))
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User> {
        if update.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("User {}", id)));
        }

        let (set_student_id, student_id) = match update.student_id {
            Some(value) => (true, value),
            None => (false, None),
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                student_id = CASE WHEN $3 THEN $4 ELSE student_id END,
                department = COALESCE($5, department),
                avatar = COALESCE($6, avatar)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&update.name)
        .bind(set_student_id)
        .bind(&student_id)
        .bind(&update.department)
        .bind(&update.avatar)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "users",
            op = "update_profile",
            user_id = %id,
            found = row.is_some(),
            "Profile update applied"
        );

        row.as_ref()
            .map(user_from_row)
            .ok_or_else(|| Error::NotFound(format!("User {}", id)))
    }
}
