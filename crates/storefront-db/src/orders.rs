//! Database operations for the `orders` table and the per-day order-number
//! counter.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

const ORDER_COLUMNS: &str = "id, order_number, user_id, items, shipping_address, payment_method, \
     payment_result, items_price, shipping_price, tax_price, total_amount, \
     status, payment_status, tracking_number, notes, created_at, updated_at";

/// A row from the `orders` table. `items` is an immutable point-in-time
/// snapshot of the purchased lines, not a live product reference.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub items: serde_json::Value,
    pub shipping_address: Option<serde_json::Value>,
    pub payment_method: Option<String>,
    pub payment_result: Option<serde_json::Value>,
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub payment_status: String,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to place an order. The order number is allocated by
/// [`create_order`], never supplied.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub items: serde_json::Value,
    pub shipping_address: Option<serde_json::Value>,
    pub payment_method: Option<String>,
    pub payment_result: Option<serde_json::Value>,
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total_amount: Decimal,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert an order, allocating its `ORD-YYMMDD-NNNN` number from the per-day
/// counter inside the same transaction.
///
/// The counter increment is a single `INSERT … ON CONFLICT … RETURNING`, so
/// concurrent order creation cannot hand out the same sequence number. The
/// day boundary is the database's UTC clock.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement in the transaction fails.
pub async fn create_order(pool: &PgPool, order: &NewOrder) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let day: NaiveDate = sqlx::query_scalar("SELECT (NOW() AT TIME ZONE 'UTC')::date")
        .fetch_one(&mut *tx)
        .await?;
    let sequence: i64 = sqlx::query_scalar(
        "INSERT INTO order_counters (day, value) VALUES ($1, 1) \
         ON CONFLICT (day) DO UPDATE SET value = order_counters.value + 1 \
         RETURNING value",
    )
    .bind(day)
    .fetch_one(&mut *tx)
    .await?;

    let order_number = storefront_core::orders::format_order_number(day, sequence);

    let sql = format!(
        "INSERT INTO orders \
           (order_number, user_id, items, shipping_address, payment_method, \
            payment_result, items_price, shipping_price, tax_price, total_amount) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING {ORDER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(&order_number)
        .bind(order.user_id)
        .bind(&order.items)
        .bind(order.shipping_address.as_ref())
        .bind(order.payment_method.as_deref())
        .bind(order.payment_result.as_ref())
        .bind(order.items_price)
        .bind(order.shipping_price)
        .bind(order.tax_price)
        .bind(order.total_amount)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(row)
}

/// Fetch one order by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order(pool: &PgPool, id: i64) -> Result<Option<OrderRow>, DbError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// List orders newest-first with offset pagination, optionally scoped to one
/// user and/or one status. Returns the page plus the unpaginated count.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_orders(
    pool: &PgPool,
    user_id: Option<i64>,
    status: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<OrderRow>, i64), DbError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM orders \
         WHERE ($1::BIGINT IS NULL OR user_id = $1) \
           AND ($2::TEXT IS NULL OR status = $2)",
    )
    .bind(user_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE ($1::BIGINT IS NULL OR user_id = $1) \
           AND ($2::TEXT IS NULL OR status = $2) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

/// Admin patch over an order's fulfillment fields: `Some(v)` sets a value,
/// `None` preserves it. Returns the updated row, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_order(
    pool: &PgPool,
    id: i64,
    status: Option<&str>,
    payment_status: Option<&str>,
    tracking_number: Option<&str>,
    notes: Option<&str>,
) -> Result<Option<OrderRow>, DbError> {
    let sql = format!(
        "UPDATE orders \
         SET status          = COALESCE($2, status), \
             payment_status  = COALESCE($3, payment_status), \
             tracking_number = COALESCE($4, tracking_number), \
             notes           = COALESCE($5, notes), \
             updated_at      = NOW() \
         WHERE id = $1 \
         RETURNING {ORDER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .bind(status)
        .bind(payment_status)
        .bind(tracking_number)
        .bind(notes)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
