//! Database operations for the `deals` table.
//!
//! Deals carry a soft `product_id` reference, so every read joins the
//! product with a LEFT JOIN and exposes the product columns as nullable.
//! Temporal status is never stored; callers classify rows on read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

const DEAL_SELECT: &str = "SELECT d.id, d.product_id, d.discount_percentage, d.start_date, \
            d.end_date, d.featured, d.is_active, d.created_at, d.updated_at, \
            p.title AS product_title, p.price AS product_price, \
            p.category AS product_category, p.brand AS product_brand, \
            p.thumbnail AS product_thumbnail \
     FROM deals d \
     LEFT JOIN products p ON p.id = d.product_id";

/// A deal joined with its (possibly deleted) product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DealWithProductRow {
    pub id: i64,
    pub product_id: i64,
    pub discount_percentage: i16,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product_title: Option<String>,
    pub product_price: Option<Decimal>,
    pub product_category: Option<String>,
    pub product_brand: Option<String>,
    pub product_thumbnail: Option<String>,
}

/// Fields required to create a deal.
#[derive(Debug, Clone)]
pub struct NewDeal {
    pub product_id: i64,
    pub discount_percentage: i16,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub featured: bool,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns deals (newest first), optionally restricted to featured ones.
///
/// Temporal filtering happens in the caller, which classifies each row
/// against the current instant.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_deals(
    pool: &PgPool,
    featured: Option<bool>,
) -> Result<Vec<DealWithProductRow>, DbError> {
    let sql = format!(
        "{DEAL_SELECT} \
         WHERE ($1::BOOL IS NULL OR d.featured = $1) \
         ORDER BY d.created_at DESC, d.id DESC"
    );
    let rows = sqlx::query_as::<_, DealWithProductRow>(&sql)
        .bind(featured)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Fetch one deal by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_deal(pool: &PgPool, id: i64) -> Result<Option<DealWithProductRow>, DbError> {
    let sql = format!("{DEAL_SELECT} WHERE d.id = $1");
    let row = sqlx::query_as::<_, DealWithProductRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Insert a deal and return it joined with its product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_deal(pool: &PgPool, deal: &NewDeal) -> Result<DealWithProductRow, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO deals \
           (product_id, discount_percentage, start_date, end_date, featured, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(deal.product_id)
    .bind(deal.discount_percentage)
    .bind(deal.start_date)
    .bind(deal.end_date)
    .bind(deal.featured)
    .bind(deal.is_active)
    .fetch_one(pool)
    .await?;

    get_deal(pool, id).await?.ok_or(DbError::NotFound)
}

/// Sparse update: `Some(v)` sets a field, `None` preserves it. Returns the
/// updated row joined with its product, or `None` if the id is absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
#[allow(clippy::too_many_arguments)] // public API for partial deal update; no sensible grouping
pub async fn update_deal(
    pool: &PgPool,
    id: i64,
    product_id: Option<i64>,
    discount_percentage: Option<i16>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    featured: Option<bool>,
    is_active: Option<bool>,
) -> Result<Option<DealWithProductRow>, DbError> {
    let updated = sqlx::query_scalar::<_, i64>(
        "UPDATE deals \
         SET product_id          = COALESCE($2, product_id), \
             discount_percentage = COALESCE($3, discount_percentage), \
             start_date          = COALESCE($4, start_date), \
             end_date            = COALESCE($5, end_date), \
             featured            = COALESCE($6, featured), \
             is_active           = COALESCE($7, is_active), \
             updated_at          = NOW() \
         WHERE id = $1 \
         RETURNING id",
    )
    .bind(id)
    .bind(product_id)
    .bind(discount_percentage)
    .bind(start_date)
    .bind(end_date)
    .bind(featured)
    .bind(is_active)
    .fetch_optional(pool)
    .await?;

    match updated {
        Some(id) => get_deal(pool, id).await,
        None => Ok(None),
    }
}

/// Delete a deal. Returns `true` if a row was removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_deal(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM deals WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
