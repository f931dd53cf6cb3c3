//! Database operations for the `contacts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

const CONTACT_COLUMNS: &str =
    "id, name, email, subject, message, status, notes, created_at, updated_at";

/// A row from the `contacts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the public contact form.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert a contact inquiry; status starts as `new`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_contact(pool: &PgPool, contact: &NewContact) -> Result<ContactRow, DbError> {
    let sql = format!(
        "INSERT INTO contacts (name, email, subject, message) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {CONTACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ContactRow>(&sql)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.subject)
        .bind(&contact.message)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// List inquiries newest-first with offset pagination, optionally filtered
/// by status and/or a case-insensitive search over name, email, subject,
/// and message. Returns the page plus the unpaginated count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_contacts(
    pool: &PgPool,
    status: Option<&str>,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<ContactRow>, i64), DbError> {
    const PREDICATE: &str = "($1::TEXT IS NULL OR status = $1) \
           AND ($2::TEXT IS NULL \
                OR name ILIKE '%' || $2 || '%' \
                OR email ILIKE '%' || $2 || '%' \
                OR subject ILIKE '%' || $2 || '%' \
                OR message ILIKE '%' || $2 || '%')";

    let count_sql = format!("SELECT COUNT(*) FROM contacts WHERE {PREDICATE}");
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(status)
        .bind(search)
        .fetch_one(pool)
        .await?;

    let page_sql = format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts \
         WHERE {PREDICATE} \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, ContactRow>(&page_sql)
        .bind(status)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Fetch one inquiry by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_contact(pool: &PgPool, id: i64) -> Result<Option<ContactRow>, DbError> {
    let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1");
    let row = sqlx::query_as::<_, ContactRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Admin patch over status/notes: `Some(v)` sets a value, `None` preserves
/// it. Other fields are immutable after intake. Returns the updated row, or
/// `None` if the id is absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_contact(
    pool: &PgPool,
    id: i64,
    status: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<ContactRow>, DbError> {
    let sql = format!(
        "UPDATE contacts \
         SET status     = COALESCE($2, status), \
             notes      = COALESCE($3, notes), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {CONTACT_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ContactRow>(&sql)
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Delete an inquiry. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_contact(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
