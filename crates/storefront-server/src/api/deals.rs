//! Deal endpoints: public listing with computed status, the storefront
//! spotlight pick, and admin CRUD with window validation.

use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::deals::{
    amount_saved, evaluate, sale_price, spotlight_rank, DealStatus, DealWindow,
};
use storefront_db::{DealWithProductRow, NewDeal};

use crate::middleware::{CurrentIdentity, RequestId};

use super::{
    map_db_error, parse_bool_param, require_admin, ApiError, ApiResponse, AppState, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct DealProductJson {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub sale_price: Decimal,
    pub amount_saved: Decimal,
    pub category: String,
    pub brand: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct DealJson {
    pub id: i64,
    pub product_id: i64,
    pub discount_percentage: i16,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub featured: bool,
    pub is_active: bool,
    /// Computed from the window at response time, never stored.
    pub status: DealStatus,
    /// `None` when the referenced product has been deleted.
    pub product: Option<DealProductJson>,
}

impl DealJson {
    fn from_row(row: DealWithProductRow, now: DateTime<Utc>) -> Self {
        let status = evaluate(
            &DealWindow {
                start_date: row.start_date,
                end_date: row.end_date,
                is_active: row.is_active,
            },
            now,
        );
        let product = match (row.product_title, row.product_price) {
            (Some(title), Some(price)) => Some(DealProductJson {
                id: row.product_id,
                title,
                price,
                sale_price: sale_price(price, row.discount_percentage),
                amount_saved: amount_saved(price, row.discount_percentage),
                category: row.product_category.unwrap_or_default(),
                brand: row.product_brand.unwrap_or_default(),
                thumbnail: row.product_thumbnail,
            }),
            _ => None,
        };
        Self {
            id: row.id,
            product_id: row.product_id,
            discount_percentage: row.discount_percentage,
            start_date: row.start_date,
            end_date: row.end_date,
            featured: row.featured,
            is_active: row.is_active,
            status,
            product,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct DealListData {
    pub deals: Vec<DealJson>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DealListParams {
    pub active: Option<String>,
    pub featured: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SpotlightParams {
    pub category: Option<String>,
}

/// Create body. Dates are required; sparse fields get defaults.
#[derive(Debug, Deserialize)]
pub(super) struct CreateDealRequest {
    #[serde(alias = "productId")]
    pub product_id: Option<i64>,
    #[serde(alias = "discountPercentage")]
    pub discount_percentage: Option<i16>,
    #[serde(alias = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(alias = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, alias = "isActive")]
    pub is_active: Option<bool>,
}

/// Sparse update body: absent fields keep their current values.
#[derive(Debug, Deserialize)]
pub(super) struct UpdateDealRequest {
    #[serde(alias = "productId")]
    pub product_id: Option<i64>,
    #[serde(alias = "discountPercentage")]
    pub discount_percentage: Option<i16>,
    #[serde(alias = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(alias = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
    pub featured: Option<bool>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_discount(req_id: &str, value: i16) -> Result<(), ApiError> {
    if (1..=99).contains(&value) {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("discount_percentage must be 1-99, got {value}"),
        ))
    }
}

fn validate_window(
    req_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ApiError> {
    if end > start {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            "end_date must be after start_date",
        ))
    }
}

async fn require_product(state: &AppState, req_id: &str, product_id: i64) -> Result<(), ApiError> {
    let exists = storefront_db::product_exists(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?;
    if exists {
        Ok(())
    } else {
        Err(ApiError::new(req_id, "not_found", "referenced product not found"))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/deals?active&featured — read open; status computed per row.
pub(super) async fn list_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<DealListParams>,
) -> Result<Json<ApiResponse<DealListData>>, ApiError> {
    let featured = parse_bool_param(params.featured.as_deref());
    let active = parse_bool_param(params.active.as_deref());

    let rows = storefront_db::list_deals(&state.pool, featured)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let now = Utc::now();
    let deals = rows
        .into_iter()
        .map(|row| DealJson::from_row(row, now))
        .filter(|deal| match active {
            Some(true) => deal.status == DealStatus::Active,
            Some(false) => deal.status != DealStatus::Active,
            None => true,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: DealListData { deals },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/deals/spotlight?category — the storefront "deal of the week".
///
/// Among currently active deals (optionally scoped to a product category):
/// featured first, then soonest-ending. `data` is null when nothing is
/// active.
pub(super) async fn spotlight(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SpotlightParams>,
) -> Result<Json<ApiResponse<Option<DealJson>>>, ApiError> {
    let rows = storefront_db::list_deals(&state.pool, None)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let now = Utc::now();
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let mut candidates: Vec<DealJson> = rows
        .into_iter()
        .map(|row| DealJson::from_row(row, now))
        .filter(|deal| deal.status == DealStatus::Active)
        .filter(|deal| match (category, &deal.product) {
            (None, _) => true,
            (Some(wanted), Some(product)) => product.category == wanted,
            (Some(_), None) => false,
        })
        .collect();
    candidates.sort_by_key(|deal| spotlight_rank(deal.featured, deal.end_date));

    Ok(Json(ApiResponse {
        data: candidates.into_iter().next(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/deals/categories — categories holding at least one active deal.
pub(super) async fn active_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let rows = storefront_db::list_deals(&state.pool, None)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let now = Utc::now();
    let categories: BTreeSet<String> = rows
        .into_iter()
        .map(|row| DealJson::from_row(row, now))
        .filter(|deal| deal.status == DealStatus::Active)
        .filter_map(|deal| deal.product.map(|p| p.category))
        .filter(|category| !category.is_empty())
        .collect();

    Ok(Json(ApiResponse {
        data: categories.into_iter().collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/deals/:id
pub(super) async fn get_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DealJson>>, ApiError> {
    let row = storefront_db::get_deal(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", "deal not found"))?;

    Ok(Json(ApiResponse {
        data: DealJson::from_row(row, Utc::now()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/deals — create (admin).
pub(super) async fn create_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Json(body): Json<CreateDealRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DealJson>>), ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let Some(product_id) = body.product_id else {
        return Err(ApiError::new(rid, "validation_error", "product_id is required"));
    };
    let Some(discount) = body.discount_percentage else {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "discount_percentage is required",
        ));
    };
    let (Some(start_date), Some(end_date)) = (body.start_date, body.end_date) else {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "start_date and end_date are required",
        ));
    };
    validate_discount(rid, discount)?;
    validate_window(rid, start_date, end_date)?;
    require_product(&state, rid, product_id).await?;

    let row = storefront_db::create_deal(
        &state.pool,
        &NewDeal {
            product_id,
            discount_percentage: discount,
            start_date,
            end_date,
            featured: body.featured,
            is_active: body.is_active.unwrap_or(true),
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: DealJson::from_row(row, Utc::now()),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/deals/:id — sparse update (admin). The merged result is
/// re-validated, so a window can't be flipped invalid one field at a time.
pub(super) async fn update_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateDealRequest>,
) -> Result<Json<ApiResponse<DealJson>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let existing = storefront_db::get_deal(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "deal not found"))?;

    let discount = body.discount_percentage.unwrap_or(existing.discount_percentage);
    let start_date = body.start_date.unwrap_or(existing.start_date);
    let end_date = body.end_date.unwrap_or(existing.end_date);
    validate_discount(rid, discount)?;
    validate_window(rid, start_date, end_date)?;
    if let Some(product_id) = body.product_id {
        if product_id != existing.product_id {
            require_product(&state, rid, product_id).await?;
        }
    }

    let row = storefront_db::update_deal(
        &state.pool,
        id,
        body.product_id,
        body.discount_percentage,
        body.start_date,
        body.end_date,
        body.featured,
        body.is_active,
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::new(rid, "not_found", "deal not found"))?;

    Ok(Json(ApiResponse {
        data: DealJson::from_row(row, Utc::now()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/deals/:id (admin).
pub(super) async fn delete_deal(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let removed = storefront_db::delete_deal(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !removed {
        return Err(ApiError::new(rid, "not_found", "deal not found"));
    }

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "message": "deal deleted" }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
