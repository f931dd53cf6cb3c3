//! Database operations for the `users` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

const USER_COLUMNS: &str = "id, name, email, password_hash, is_admin, created_at, updated_at";

/// A row from the `users` table. The password hash never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a user and return the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including the unique
/// violation raised for a duplicate email.
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    is_admin: bool,
) -> Result<UserRow, DbError> {
    let sql = format!(
        "INSERT INTO users (name, email, password_hash, is_admin) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {USER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Fetch one user by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user(pool: &PgPool, id: i64) -> Result<Option<UserRow>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Fetch one user by email (exact, case-insensitive), or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// List users newest-first with offset pagination, plus the total count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_users(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserRow>, i64), DbError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1 OFFSET $2"
    );
    let rows = sqlx::query_as::<_, UserRow>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Number of admin accounts; zero means first-run setup is still open.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_admins(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_admin = TRUE")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Sparse update: `Some(v)` sets a field, `None` preserves it. Returns the
/// updated row, or `None` if the id is absent.
///
/// Callers gate who may flip `is_admin`; this layer just writes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including the unique
/// violation raised when changing to an email that is already taken.
pub async fn update_user(
    pool: &PgPool,
    id: i64,
    name: Option<&str>,
    email: Option<&str>,
    password_hash: Option<&str>,
    is_admin: Option<bool>,
) -> Result<Option<UserRow>, DbError> {
    let sql = format!(
        "UPDATE users \
         SET name          = COALESCE($2, name), \
             email         = COALESCE($3, email), \
             password_hash = COALESCE($4, password_hash), \
             is_admin      = COALESCE($5, is_admin), \
             updated_at    = NOW() \
         WHERE id = $1 \
         RETURNING {USER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(is_admin)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Delete a user. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_user(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
