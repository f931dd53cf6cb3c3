//! Catalog endpoints: browsing with the full filter set, admin CRUD, and
//! bulk import.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::import::map_external_product;
use storefront_core::products::{derive_is_sale, is_valid_availability_status, ProductDraft};
use storefront_db::{ProductFilters, ProductRow, SortOrder};

use crate::middleware::{CurrentIdentity, RequestId};

use super::{
    map_db_error, parse_bool_param, parse_decimal_param, parse_limit, parse_list_param,
    parse_page, require_admin, ApiError, ApiResponse, AppState, Pagination, ResponseMeta,
};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ProductJson {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub discount_percentage: i16,
    /// Derived, never stored: present only when a discount applies.
    pub sale_price: Option<Decimal>,
    pub category: String,
    pub brand: String,
    pub thumbnail: Option<String>,
    pub images: Vec<String>,
    pub stock: i32,
    pub sku: Option<String>,
    pub availability_status: String,
    pub minimum_order_quantity: i32,
    pub tags: Vec<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub material: Option<String>,
    pub weight: Option<Decimal>,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub depth: Option<Decimal>,
    pub warranty_information: Option<String>,
    pub shipping_information: Option<String>,
    pub return_policy: Option<String>,
    pub is_new: bool,
    pub is_sale: bool,
    pub is_featured: bool,
    pub is_best_seller: bool,
    pub rating: Decimal,
    pub reviews: serde_json::Value,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductJson {
    fn from(row: ProductRow) -> Self {
        let sale_price = (row.discount_percentage > 0)
            .then(|| storefront_core::deals::sale_price(row.price, row.discount_percentage));
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            short_description: row.short_description,
            price: row.price,
            discount_percentage: row.discount_percentage,
            sale_price,
            category: row.category,
            brand: row.brand,
            thumbnail: row.thumbnail,
            images: row.images,
            stock: row.stock,
            sku: row.sku,
            availability_status: row.availability_status,
            minimum_order_quantity: row.minimum_order_quantity,
            tags: row.tags,
            colors: row.colors,
            sizes: row.sizes,
            material: row.material,
            weight: row.weight,
            width: row.width,
            height: row.height,
            depth: row.depth,
            warranty_information: row.warranty_information,
            shipping_information: row.shipping_information,
            return_policy: row.return_policy,
            is_new: row.is_new,
            is_sale: row.is_sale,
            is_featured: row.is_featured,
            is_best_seller: row.is_best_seller,
            rating: row.rating,
            reviews: row.reviews,
            barcode: row.barcode,
            qr_code: row.qr_code,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductListData {
    pub products: Vec<ProductJson>,
    pub pagination: Pagination,
}

/// Raw catalog query parameters. Numeric and boolean values arrive as
/// strings and are parsed defensively; garbage means "unset", never a 4xx.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CatalogParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    #[serde(alias = "minPrice")]
    pub min_price: Option<String>,
    #[serde(alias = "maxPrice")]
    pub max_price: Option<String>,
    pub colors: Option<String>,
    pub sizes: Option<String>,
    #[serde(alias = "isNew")]
    pub is_new: Option<String>,
    #[serde(alias = "isSale")]
    pub is_sale: Option<String>,
    #[serde(alias = "isFeatured")]
    pub is_featured: Option<String>,
    #[serde(alias = "isBestSeller")]
    pub is_best_seller: Option<String>,
    #[serde(alias = "inStock")]
    pub in_stock: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl CatalogParams {
    fn filters(&self) -> ProductFilters {
        ProductFilters {
            category: non_empty(self.category.as_deref()),
            brand: non_empty(self.brand.as_deref()),
            min_price: parse_decimal_param(self.min_price.as_deref()),
            max_price: parse_decimal_param(self.max_price.as_deref()),
            colors: parse_list_param(self.colors.as_deref()),
            sizes: parse_list_param(self.sizes.as_deref()),
            is_new: parse_bool_param(self.is_new.as_deref()),
            is_sale: parse_bool_param(self.is_sale.as_deref()),
            is_featured: parse_bool_param(self.is_featured.as_deref()),
            is_best_seller: parse_bool_param(self.is_best_seller.as_deref()),
            in_stock: parse_bool_param(self.in_stock.as_deref()) == Some(true),
            search: non_empty(self.search.as_deref()),
        }
    }
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

/// Full product payload for create (POST) and replace (PUT).
///
/// A client-supplied `is_sale` key is ignored; the stored flag is derived
/// from the discount and the optional explicit sale price.
#[derive(Debug, Deserialize)]
pub(super) struct ProductBody {
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "shortDescription")]
    pub short_description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default, alias = "discountPercentage")]
    pub discount_percentage: i16,
    #[serde(default, alias = "salePrice")]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default, alias = "availabilityStatus")]
    pub availability_status: Option<String>,
    #[serde(default, alias = "minimumOrderQuantity")]
    pub minimum_order_quantity: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub weight: Option<Decimal>,
    #[serde(default)]
    pub width: Option<Decimal>,
    #[serde(default)]
    pub height: Option<Decimal>,
    #[serde(default)]
    pub depth: Option<Decimal>,
    #[serde(default, alias = "warrantyInformation")]
    pub warranty_information: Option<String>,
    #[serde(default, alias = "shippingInformation")]
    pub shipping_information: Option<String>,
    #[serde(default, alias = "returnPolicy")]
    pub return_policy: Option<String>,
    #[serde(default, alias = "isNew")]
    pub is_new: bool,
    #[serde(default, alias = "isFeatured")]
    pub is_featured: bool,
    #[serde(default, alias = "isBestSeller")]
    pub is_best_seller: bool,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub reviews: Option<serde_json::Value>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default, alias = "qrCode")]
    pub qr_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ImportReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImportRequest {
    #[serde(default)]
    pub products: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check bounds and assemble the draft plus the derived `is_sale` flag.
fn validate_body(req_id: &str, body: ProductBody) -> Result<(ProductDraft, bool), ApiError> {
    let title = body.title.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() || title.len() > 300 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "title must be 1-300 characters",
        ));
    }
    let Some(price) = body.price else {
        return Err(ApiError::new(req_id, "validation_error", "price is required"));
    };
    if price < Decimal::ZERO {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "price must be >= 0",
        ));
    }
    if !(0..=100).contains(&body.discount_percentage) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!(
                "discount_percentage must be 0-100, got {}",
                body.discount_percentage
            ),
        ));
    }
    if body.stock < 0 {
        return Err(ApiError::new(req_id, "validation_error", "stock must be >= 0"));
    }
    let minimum_order_quantity = body.minimum_order_quantity.unwrap_or(1);
    if minimum_order_quantity < 1 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "minimum_order_quantity must be >= 1",
        ));
    }
    let availability_status = body
        .availability_status
        .unwrap_or_else(|| "In Stock".to_string());
    if !is_valid_availability_status(&availability_status) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("unknown availability_status '{availability_status}'"),
        ));
    }
    let rating = body.rating.unwrap_or(Decimal::ZERO);
    if rating < Decimal::ZERO || rating > Decimal::from(5) {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "rating must be between 0 and 5",
        ));
    }

    let is_sale = derive_is_sale(body.discount_percentage, body.sale_price, price);

    let mut draft = ProductDraft::bare(title, price);
    draft.description = body.description;
    draft.short_description = body.short_description;
    draft.discount_percentage = body.discount_percentage;
    draft.category = body.category;
    draft.brand = body.brand;
    draft.thumbnail = body.thumbnail;
    draft.images = body.images;
    draft.stock = body.stock;
    draft.sku = body.sku;
    draft.availability_status = availability_status;
    draft.minimum_order_quantity = minimum_order_quantity;
    draft.tags = body.tags;
    draft.colors = body.colors;
    draft.sizes = body.sizes;
    draft.material = body.material;
    draft.weight = body.weight;
    draft.width = body.width;
    draft.height = body.height;
    draft.depth = body.depth;
    draft.warranty_information = body.warranty_information;
    draft.shipping_information = body.shipping_information;
    draft.return_policy = body.return_policy;
    draft.is_new = body.is_new;
    draft.is_featured = body.is_featured;
    draft.is_best_seller = body.is_best_seller;
    draft.rating = rating;
    draft.reviews = body.reviews.unwrap_or_else(|| serde_json::Value::Array(Vec::new()));
    draft.barcode = body.barcode;
    draft.qr_code = body.qr_code;

    Ok((draft, is_sale))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/products — the catalog query.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    let page = parse_page(params.page.as_deref());
    let limit = parse_limit(params.limit.as_deref(), 12);
    let filters = params.filters();

    let result = storefront_db::list_products(
        &state.pool,
        &filters,
        params.sort.as_deref(),
        SortOrder::parse(params.order.as_deref()),
        limit,
        (page - 1) * limit,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductListData {
            products: result.items.into_iter().map(ProductJson::from).collect(),
            pagination: Pagination::new(result.total, page, limit),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/products/:id
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductJson>>, ApiError> {
    let row = storefront_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, "not_found", "product not found"))?;

    Ok(Json(ApiResponse {
        data: ProductJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/products — create (admin).
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Json(body): Json<ProductBody>,
) -> Result<(StatusCode, Json<ApiResponse<ProductJson>>), ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;
    let (draft, is_sale) = validate_body(rid, body)?;

    let row = storefront_db::create_product(&state.pool, &draft, is_sale)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductJson::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PUT /api/products/:id — full replace (admin).
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<ProductBody>,
) -> Result<Json<ApiResponse<ProductJson>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;
    let (draft, is_sale) = validate_body(rid, body)?;

    let row = storefront_db::update_product(&state.pool, id, &draft, is_sale)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "product not found"))?;

    Ok(Json(ApiResponse {
        data: ProductJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/products/:id — hard delete (admin).
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let removed = storefront_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !removed {
        return Err(ApiError::new(rid, "not_found", "product not found"));
    }

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "message": "product deleted" }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/products/import — bulk import (admin).
///
/// Rows fail individually; one bad row never aborts the batch.
pub(super) async fn import_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Json(body): Json<ImportRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let total = body.products.len();
    let mut success = 0usize;
    let mut errors = Vec::new();

    for (index, raw) in body.products.iter().enumerate() {
        let row = index + 1;
        match map_external_product(raw) {
            Ok(draft) => {
                let is_sale = derive_is_sale(draft.discount_percentage, None, draft.price);
                match storefront_db::create_product(&state.pool, &draft, is_sale).await {
                    Ok(_) => success += 1,
                    Err(e) => {
                        tracing::warn!(row, error = %e, "import row failed to persist");
                        errors.push(format!("row {row}: failed to persist"));
                    }
                }
            }
            Err(e) => errors.push(format!("row {row}: {e}")),
        }
    }

    Ok(Json(ApiResponse {
        data: ImportReport {
            total,
            success,
            failed: total - success,
            errors,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
