//! Database operations for the `products` table, including the catalog
//! query builder behind storefront browsing and search.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_core::products::ProductDraft;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

const PRODUCT_COLUMNS: &str = "id, title, description, short_description, price, \
     discount_percentage, category, brand, thumbnail, images, stock, sku, \
     availability_status, minimum_order_quantity, tags, colors, sizes, material, \
     weight, width, height, depth, warranty_information, shipping_information, \
     return_policy, is_new, is_sale, is_featured, is_best_seller, rating, reviews, \
     barcode, qr_code, created_at, updated_at";

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub discount_percentage: i16,
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

// ---------------------------------------------------------------------------
// Catalog query builder
// ---------------------------------------------------------------------------

/// Optional catalog filters. Absent filters add no constraint.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub colors: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub is_new: Option<bool>,
    pub is_sale: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_best_seller: Option<bool>,
    /// `true` constrains to stock > 0; `false`/absent adds no constraint.
    pub in_stock: bool,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Maps "asc" (any case) to ascending; everything else is descending.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One page of catalog results plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub items: Vec<ProductRow>,
    pub total: i64,
}

// Shared filter predicate; bind order is fixed and used by both the page and
// count queries. $12 is the search term, also referenced by the relevance
// ORDER BY.
const FILTER_PREDICATE: &str = "($1::TEXT IS NULL OR category = $1) \
       AND ($2::TEXT IS NULL OR brand = $2) \
       AND ($3::NUMERIC IS NULL OR price >= $3) \
       AND ($4::NUMERIC IS NULL OR price <= $4) \
       AND ($5::TEXT[] IS NULL OR colors && $5) \
       AND ($6::TEXT[] IS NULL OR sizes && $6) \
       AND ($7::BOOL IS NULL OR is_new = $7) \
       AND ($8::BOOL IS NULL OR is_sale = $8) \
       AND ($9::BOOL IS NULL OR is_featured = $9) \
       AND ($10::BOOL IS NULL OR is_best_seller = $10) \
       AND ($11::BOOL IS NULL OR stock > 0) \
       AND ($12::TEXT IS NULL \
            OR title ILIKE '%' || $12 || '%' \
            OR description ILIKE '%' || $12 || '%' \
            OR brand ILIKE '%' || $12 || '%' \
            OR category ILIKE '%' || $12 || '%' \
            OR EXISTS (SELECT 1 FROM unnest(tags) tag WHERE tag ILIKE '%' || $12 || '%'))";

/// Translate the requested sort into a safe ORDER BY clause.
///
/// Sort fields are whitelisted; anything unrecognized falls back to newest
/// first, except that an un-sorted search ranks title matches ahead of
/// matches found elsewhere in the document. `id` tiebreak keeps offset
/// pagination stable.
fn order_clause(sort: Option<&str>, order: SortOrder, has_search: bool) -> String {
    let dir = order.sql();
    match sort {
        Some("price") => format!("price {dir}, id DESC"),
        Some("title") => format!("title {dir}, id DESC"),
        Some("rating") => format!("rating {dir}, id DESC"),
        Some("stock") => format!("stock {dir}, id DESC"),
        Some("created_at" | "createdAt") => format!("created_at {dir}, id DESC"),
        _ if has_search => "(title ILIKE '%' || $12 || '%') DESC, created_at DESC, id DESC".to_string(),
        _ => "created_at DESC, id DESC".to_string(),
    }
}

/// Count catalog rows matching the filters.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &PgPool, filters: &ProductFilters) -> Result<i64, DbError> {
    let sql = format!("SELECT COUNT(*) FROM products WHERE {FILTER_PREDICATE}");
    let total = sqlx::query_scalar::<_, i64>(&sql)
        .bind(filters.category.as_deref())
        .bind(filters.brand.as_deref())
        .bind(filters.min_price)
        .bind(filters.max_price)
        .bind(filters.colors.as_deref())
        .bind(filters.sizes.as_deref())
        .bind(filters.is_new)
        .bind(filters.is_sale)
        .bind(filters.is_featured)
        .bind(filters.is_best_seller)
        .bind(if filters.in_stock { Some(true) } else { None })
        .bind(filters.search.as_deref())
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Run the catalog query: filters, sort, and offset pagination in one shot.
///
/// A page past the end of the data yields an empty item list with the
/// correct total, not an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either the count or page query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: &ProductFilters,
    sort: Option<&str>,
    order: SortOrder,
    limit: i64,
    offset: i64,
) -> Result<ProductPage, DbError> {
    let total = count_products(pool, filters).await?;

    let order_by = order_clause(sort, order, filters.search.is_some());
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE {FILTER_PREDICATE} \
         ORDER BY {order_by} \
         LIMIT $13 OFFSET $14"
    );
    let items = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(filters.category.as_deref())
        .bind(filters.brand.as_deref())
        .bind(filters.min_price)
        .bind(filters.max_price)
        .bind(filters.colors.as_deref())
        .bind(filters.sizes.as_deref())
        .bind(filters.is_new)
        .bind(filters.is_sale)
        .bind(filters.is_featured)
        .bind(filters.is_best_seller)
        .bind(if filters.in_stock { Some(true) } else { None })
        .bind(filters.search.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(ProductPage { items, total })
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Fetch a single product by id, or `None` if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Returns `true` when a product with this id exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn product_exists(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Insert a new product and return the full row.
///
/// `is_sale` is supplied by the caller, which derives it from the draft
/// rather than trusting any client flag.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn create_product(
    pool: &PgPool,
    draft: &ProductDraft,
    is_sale: bool,
) -> Result<ProductRow, DbError> {
    let sql = format!(
        "INSERT INTO products \
           (title, description, short_description, price, discount_percentage, \
            category, brand, thumbnail, images, stock, sku, availability_status, \
            minimum_order_quantity, tags, colors, sizes, material, weight, width, \
            height, depth, warranty_information, shipping_information, return_policy, \
            is_new, is_sale, is_featured, is_best_seller, rating, reviews, barcode, qr_code) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, \
                 $29, $30, $31, $32) \
         RETURNING {PRODUCT_COLUMNS}"
    );
    let row = bind_draft(sqlx::query_as::<_, ProductRow>(&sql), draft, is_sale)
        .fetch_one(pool)
        .await?;
    Ok(row)
}

/// Replace every mutable field of an existing product (PUT semantics) and
/// return the updated row, or `None` if the id is absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    draft: &ProductDraft,
    is_sale: bool,
) -> Result<Option<ProductRow>, DbError> {
    let sql = format!(
        "UPDATE products SET \
            title = $1, description = $2, short_description = $3, price = $4, \
            discount_percentage = $5, category = $6, brand = $7, thumbnail = $8, \
            images = $9, stock = $10, sku = $11, availability_status = $12, \
            minimum_order_quantity = $13, tags = $14, colors = $15, sizes = $16, \
            material = $17, weight = $18, width = $19, height = $20, depth = $21, \
            warranty_information = $22, shipping_information = $23, return_policy = $24, \
            is_new = $25, is_sale = $26, is_featured = $27, is_best_seller = $28, \
            rating = $29, reviews = $30, barcode = $31, qr_code = $32, \
            updated_at = NOW() \
         WHERE id = $33 \
         RETURNING {PRODUCT_COLUMNS}"
    );
    let row = bind_draft(sqlx::query_as::<_, ProductRow>(&sql), draft, is_sale)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Hard-delete a product. Returns `true` if a row was removed.
///
/// Deals referencing the product are left in place; their read paths
/// null-check the join.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

type ProductQuery<'q> =
    sqlx::query::QueryAs<'q, sqlx::Postgres, ProductRow, sqlx::postgres::PgArguments>;

// $1..$32 in the draft field order shared by INSERT and UPDATE.
fn bind_draft<'q>(
    query: ProductQuery<'q>,
    draft: &'q ProductDraft,
    is_sale: bool,
) -> ProductQuery<'q> {
    query
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.short_description.as_deref())
        .bind(draft.price)
        .bind(draft.discount_percentage)
        .bind(&draft.category)
        .bind(&draft.brand)
        .bind(draft.thumbnail.as_deref())
        .bind(&draft.images)
        .bind(draft.stock)
        .bind(draft.sku.as_deref())
        .bind(&draft.availability_status)
        .bind(draft.minimum_order_quantity)
        .bind(&draft.tags)
        .bind(&draft.colors)
        .bind(&draft.sizes)
        .bind(draft.material.as_deref())
        .bind(draft.weight)
        .bind(draft.width)
        .bind(draft.height)
        .bind(draft.depth)
        .bind(draft.warranty_information.as_deref())
        .bind(draft.shipping_information.as_deref())
        .bind(draft.return_policy.as_deref())
        .bind(draft.is_new)
        .bind(is_sale)
        .bind(draft.is_featured)
        .bind(draft.is_best_seller)
        .bind(draft.rating)
        .bind(&draft.reviews)
        .bind(draft.barcode.as_deref())
        .bind(draft.qr_code.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_order_parses_asc_case_insensitively() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
    }

    #[test]
    fn order_clause_whitelists_fields() {
        assert_eq!(order_clause(Some("price"), SortOrder::Asc, false), "price ASC, id DESC");
        assert_eq!(
            order_clause(Some("created_at"), SortOrder::Desc, false),
            "created_at DESC, id DESC"
        );
    }

    #[test]
    fn unknown_sort_falls_back_to_newest_first() {
        assert_eq!(
            order_clause(Some("'; DROP TABLE products; --"), SortOrder::Asc, false),
            "created_at DESC, id DESC"
        );
        assert_eq!(order_clause(None, SortOrder::Asc, false), "created_at DESC, id DESC");
    }

    #[test]
    fn search_without_explicit_sort_ranks_title_matches_first() {
        let clause = order_clause(None, SortOrder::Desc, true);
        assert!(clause.starts_with("(title ILIKE"));
    }

    #[test]
    fn explicit_sort_overrides_search_relevance() {
        assert_eq!(order_clause(Some("price"), SortOrder::Asc, true), "price ASC, id DESC");
    }
}
