//! Free-text catalog search. Same envelope as the catalog listing; the text
//! match spans title, description, brand, category, and tags.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use storefront_db::{ProductFilters, SortOrder};

use crate::middleware::RequestId;

use super::products::{ProductJson, ProductListData};
use super::{
    map_db_error, parse_limit, parse_page, ApiError, ApiResponse, AppState, Pagination,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct SearchParams {
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// GET /api/search?q=…
pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    let page = parse_page(params.page.as_deref());
    let limit = parse_limit(params.limit.as_deref(), 12);

    let filters = ProductFilters {
        search: params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(ToOwned::to_owned),
        ..ProductFilters::default()
    };

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
