//! Order endpoints: placement at checkout success, self-or-admin reads,
//! and admin fulfillment patches.
//!
//! Order lines are an immutable snapshot of the cart at purchase time; they
//! are stored as submitted (after amount recomputation) and never re-derived
//! from the live catalog.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::cart::{totals, CartItem, PricingRules};
use storefront_db::{NewOrder, OrderRow};

use crate::middleware::{CurrentIdentity, RequestId};

use super::{
    map_db_error, parse_limit, parse_page, require_admin, require_user, ApiError, ApiResponse,
    AppState, Pagination, ResponseMeta,
};

const ORDER_STATUSES: [&str; 5] = ["pending", "processing", "shipped", "delivered", "cancelled"];
const PAYMENT_STATUSES: [&str; 4] = ["pending", "paid", "failed", "refunded"];

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct OrderJson {
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

impl From<OrderRow> for OrderJson {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            user_id: row.user_id,
            items: row.items,
            shipping_address: row.shipping_address,
            payment_method: row.payment_method,
            payment_result: row.payment_result,
            items_price: row.items_price,
            shipping_price: row.shipping_price,
            tax_price: row.tax_price,
            total_amount: row.total_amount,
            status: row.status,
            payment_status: row.payment_status,
            tracking_number: row.tracking_number,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OrderListData {
    pub orders: Vec<OrderJson>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default, alias = "shippingAddress")]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "paymentResult")]
    pub payment_result: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateOrderRequest {
    pub status: Option<String>,
    #[serde(alias = "paymentStatus")]
    pub payment_status: Option<String>,
    #[serde(alias = "trackingNumber")]
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub(super) fn validate_cart_items(req_id: &str, items: &[CartItem]) -> Result<(), ApiError> {
    if items.is_empty() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "order must contain at least one item",
        ));
    }
    for item in items {
        if item.quantity == 0 {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                format!("quantity for '{}' must be >= 1", item.name),
            ));
        }
        if item.price < Decimal::ZERO || item.sale_price.is_some_and(|sp| sp < Decimal::ZERO) {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                format!("price for '{}' must be >= 0", item.name),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/orders — place an order (any authenticated caller).
///
/// All amounts are recomputed server-side from the item snapshot; the order
/// number is allocated atomically inside the insert transaction.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderJson>>), ApiError> {
    let rid = &req_id.0;
    let caller = require_user(&current, rid)?;
    validate_cart_items(rid, &body.items)?;

    let rules = PricingRules {
        flat_shipping: state.config.flat_shipping,
        free_shipping_over: state.config.free_shipping_over,
        tax_rate: state.config.tax_rate,
    };
    let amounts = totals(&body.items, &rules);
    let items = serde_json::to_value(&body.items).map_err(|e| {
        tracing::error!(error = %e, "cart snapshot serialization failed");
        ApiError::new(rid, "internal_error", "could not record order items")
    })?;

    let row = storefront_db::create_order(
        &state.pool,
        &NewOrder {
            user_id: caller.id,
            items,
            shipping_address: body.shipping_address,
            payment_method: body.payment_method,
            payment_result: body.payment_result,
            items_price: amounts.items_price,
            shipping_price: amounts.shipping_price,
            tax_price: amounts.tax_price,
            total_amount: amounts.total,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: OrderJson::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/orders — admins see every order; everyone else sees their own.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<ApiResponse<OrderListData>>, ApiError> {
    let rid = &req_id.0;
    let caller = require_user(&current, rid)?;

    let page = parse_page(params.page.as_deref());
    let limit = parse_limit(params.limit.as_deref(), 20);
    let status = params
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| ORDER_STATUSES.contains(s));
    let user_id = if caller.is_admin {
        params
            .user_id
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
    } else {
        Some(caller.id)
    };

    let (rows, total) =
        storefront_db::list_orders(&state.pool, user_id, status, limit, (page - 1) * limit)
            .await
            .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OrderListData {
            orders: rows.into_iter().map(OrderJson::from).collect(),
            pagination: Pagination::new(total, page, limit),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/orders/:id (self or admin).
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderJson>>, ApiError> {
    let rid = &req_id.0;
    let caller = require_user(&current, rid)?;

    let row = storefront_db::get_order(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "order not found"))?;

    if row.user_id != caller.id && !caller.is_admin {
        return Err(ApiError::new(rid, "unauthorized", "not your order"));
    }

    Ok(Json(ApiResponse {
        data: OrderJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/orders/:id — fulfillment fields only (admin).
pub(super) async fn update_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateOrderRequest>,
) -> Result<Json<ApiResponse<OrderJson>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    if let Some(ref status) = body.status {
        if !ORDER_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("unknown order status '{status}'"),
            ));
        }
    }
    if let Some(ref payment_status) = body.payment_status {
        if !PAYMENT_STATUSES.contains(&payment_status.as_str()) {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("unknown payment status '{payment_status}'"),
            ));
        }
    }

    let row = storefront_db::update_order(
        &state.pool,
        id,
        body.status.as_deref(),
        body.payment_status.as_deref(),
        body.tracking_number.as_deref(),
        body.notes.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::new(rid, "not_found", "order not found"))?;

    Ok(Json(ApiResponse {
        data: OrderJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
