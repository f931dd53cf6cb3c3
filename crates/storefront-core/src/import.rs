//! Field mapping for bulk product import.
//!
//! Import payloads come from heterogeneous external catalogs, so field names
//! vary (`title` vs `name`, `thumbnail` vs `image`, `images` vs `gallery`)
//! and numbers sometimes arrive as strings. Each row maps independently; a
//! bad row yields an error for the batch report without touching its
//! neighbors.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::products::{is_valid_availability_status, ProductDraft};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportRowError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Map one external product object into a [`ProductDraft`].
///
/// # Errors
///
/// Returns [`ImportRowError`] when the row has no usable title, no usable
/// price, or an out-of-range numeric field.
pub fn map_external_product(raw: &Value) -> Result<ProductDraft, ImportRowError> {
    let title = first_string(raw, &["title", "name"])
        .filter(|t| !t.trim().is_empty())
        .ok_or(ImportRowError::MissingField("title"))?;

    let price = first_decimal(raw, &["price"])?.ok_or(ImportRowError::MissingField("price"))?;
    if price < Decimal::ZERO {
        return Err(ImportRowError::InvalidField {
            field: "price",
            reason: format!("must be >= 0, got {price}"),
        });
    }

    let discount_percentage = match first_i64(raw, &["discountPercentage", "discount_percentage"])
    {
        Some(d) if (0..=100).contains(&d) => i16::try_from(d).unwrap_or(0),
        Some(d) => {
            return Err(ImportRowError::InvalidField {
                field: "discountPercentage",
                reason: format!("must be 0-100, got {d}"),
            })
        }
        None => 0,
    };

    let mut draft = ProductDraft::bare(title.trim(), price.round_dp(2));
    draft.discount_percentage = discount_percentage;
    draft.description = first_string(raw, &["description"]).unwrap_or_default();
    draft.short_description = first_string(raw, &["shortDescription", "short_description"]);
    draft.category = first_string(raw, &["category"]).unwrap_or_default();
    draft.brand = first_string(raw, &["brand", "vendor"]).unwrap_or_default();
    draft.thumbnail = first_string(raw, &["thumbnail", "image"]);
    draft.images = first_string_list(raw, &["images", "gallery"]);
    draft.stock = first_i64(raw, &["stock"])
        .and_then(|s| i32::try_from(s).ok())
        .map_or(0, |s| s.max(0));
    draft.sku = first_string(raw, &["sku"]);
    if let Some(status) = first_string(raw, &["availabilityStatus", "availability_status"]) {
        if is_valid_availability_status(&status) {
            draft.availability_status = status;
        }
    }
    draft.minimum_order_quantity = first_i64(raw, &["minimumOrderQuantity", "minimum_order_quantity"])
        .and_then(|q| i32::try_from(q).ok())
        .map_or(1, |q| q.max(1));
    draft.tags = first_string_list(raw, &["tags"]);
    draft.colors = first_string_list(raw, &["colors"]);
    draft.sizes = first_string_list(raw, &["sizes"]);
    draft.material = first_string(raw, &["material"]);
    draft.weight = first_decimal(raw, &["weight"])?;
    if let Some(dims) = raw.get("dimensions") {
        draft.width = first_decimal(dims, &["width"])?;
        draft.height = first_decimal(dims, &["height"])?;
        draft.depth = first_decimal(dims, &["depth"])?;
    }
    draft.warranty_information = first_string(raw, &["warrantyInformation", "warranty_information"]);
    draft.shipping_information = first_string(raw, &["shippingInformation", "shipping_information"]);
    draft.return_policy = first_string(raw, &["returnPolicy", "return_policy"]);
    draft.is_new = first_bool(raw, &["isNew", "is_new"]).unwrap_or(false);
    draft.is_featured = first_bool(raw, &["isFeatured", "is_featured"]).unwrap_or(false);
    draft.is_best_seller = first_bool(raw, &["isBestSeller", "is_best_seller"]).unwrap_or(false);
    draft.rating = first_decimal(raw, &["rating"])?
        .map_or(Decimal::ZERO, |r| r.clamp(Decimal::ZERO, Decimal::from(5)));
    if let Some(reviews) = raw.get("reviews").filter(|v| v.is_array()) {
        draft.reviews = reviews.clone();
    }
    if let Some(meta) = raw.get("meta") {
        draft.barcode = first_string(meta, &["barcode"]);
        draft.qr_code = first_string(meta, &["qrCode", "qr_code"]);
    }
    draft.barcode = draft.barcode.or_else(|| first_string(raw, &["barcode"]));

    Ok(draft)
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| raw.get(k))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

fn first_bool(raw: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|k| raw.get(k)).and_then(Value::as_bool)
}

fn first_i64(raw: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| raw.get(k)).and_then(Value::as_i64)
}

/// Accepts a JSON number or a numeric string; anything else is an error for
/// the named field.
fn first_decimal(raw: &Value, keys: &[&str]) -> Result<Option<Decimal>, ImportRowError> {
    let Some((key, value)) = keys.iter().find_map(|k| raw.get(k).map(|v| (*k, v))) else {
        return Ok(None);
    };
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(Decimal::from_f64)
            .map(Some)
            .ok_or_else(|| ImportRowError::InvalidField {
                field: field_name(key),
                reason: format!("not a representable number: {n}"),
            }),
        Value::String(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(|_| ImportRowError::InvalidField {
                field: field_name(key),
                reason: format!("not numeric: '{s}'"),
            }),
        Value::Null => Ok(None),
        other => Err(ImportRowError::InvalidField {
            field: field_name(key),
            reason: format!("expected a number, got {other}"),
        }),
    }
}

/// A list of strings, or a single string promoted to a one-element list.
fn first_string_list(raw: &Value, keys: &[&str]) -> Vec<String> {
    let Some(value) = keys.iter().find_map(|k| raw.get(k)) else {
        return Vec::new();
    };
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(ToOwned::to_owned)
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

// ImportRowError keys are 'static; intern the handful we report on.
fn field_name(key: &str) -> &'static str {
    match key {
        "price" => "price",
        "weight" => "weight",
        "width" => "width",
        "height" => "height",
        "depth" => "depth",
        "rating" => "rating",
        _ => "value",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn maps_canonical_shape() {
        let raw = json!({
            "title": "Trail Shoe",
            "description": "A shoe",
            "price": 89.5,
            "discountPercentage": 10,
            "category": "shoes",
            "brand": "Acme",
            "thumbnail": "https://cdn.example.com/t.jpg",
            "images": ["https://cdn.example.com/1.jpg", "https://cdn.example.com/2.jpg"],
            "stock": 12,
            "tags": ["trail", "running"],
        });
        let draft = map_external_product(&raw).expect("maps");
        assert_eq!(draft.title, "Trail Shoe");
        assert_eq!(draft.price, Decimal::new(8_950, 2));
        assert_eq!(draft.discount_percentage, 10);
        assert_eq!(draft.images.len(), 2);
        assert_eq!(draft.tags, vec!["trail", "running"]);
    }

    #[test]
    fn falls_back_to_alternate_field_names() {
        let raw = json!({
            "name": "Mug",
            "price": "12.99",
            "image": "https://cdn.example.com/mug.jpg",
            "gallery": ["https://cdn.example.com/mug-side.jpg"],
        });
        let draft = map_external_product(&raw).expect("maps");
        assert_eq!(draft.title, "Mug");
        assert_eq!(draft.price, Decimal::new(1_299, 2));
        assert_eq!(draft.thumbnail.as_deref(), Some("https://cdn.example.com/mug.jpg"));
        assert_eq!(draft.images.len(), 1);
    }

    #[test]
    fn missing_title_is_an_error() {
        let raw = json!({ "price": 5 });
        assert_eq!(
            map_external_product(&raw).unwrap_err(),
            ImportRowError::MissingField("title")
        );
    }

    #[test]
    fn blank_title_is_an_error() {
        let raw = json!({ "title": "   ", "price": 5 });
        assert_eq!(
            map_external_product(&raw).unwrap_err(),
            ImportRowError::MissingField("title")
        );
    }

    #[test]
    fn missing_price_is_an_error() {
        let raw = json!({ "title": "Mug" });
        assert_eq!(
            map_external_product(&raw).unwrap_err(),
            ImportRowError::MissingField("price")
        );
    }

    #[test]
    fn negative_price_is_an_error() {
        let raw = json!({ "title": "Mug", "price": -1 });
        assert!(matches!(
            map_external_product(&raw).unwrap_err(),
            ImportRowError::InvalidField { field: "price", .. }
        ));
    }

    #[test]
    fn non_numeric_price_string_is_an_error() {
        let raw = json!({ "title": "Mug", "price": "free" });
        assert!(matches!(
            map_external_product(&raw).unwrap_err(),
            ImportRowError::InvalidField { field: "price", .. }
        ));
    }

    #[test]
    fn out_of_range_discount_is_an_error() {
        let raw = json!({ "title": "Mug", "price": 5, "discountPercentage": 120 });
        assert!(matches!(
            map_external_product(&raw).unwrap_err(),
            ImportRowError::InvalidField { field: "discountPercentage", .. }
        ));
    }

    #[test]
    fn defensive_defaults_for_absent_fields() {
        let raw = json!({ "title": "Mug", "price": 5 });
        let draft = map_external_product(&raw).expect("maps");
        assert_eq!(draft.stock, 0);
        assert_eq!(draft.minimum_order_quantity, 1);
        assert_eq!(draft.availability_status, "In Stock");
        assert_eq!(draft.rating, Decimal::ZERO);
        assert!(draft.images.is_empty());
    }

    #[test]
    fn negative_stock_clamps_to_zero() {
        let raw = json!({ "title": "Mug", "price": 5, "stock": -3 });
        assert_eq!(map_external_product(&raw).expect("maps").stock, 0);
    }

    #[test]
    fn rating_clamps_to_five() {
        let raw = json!({ "title": "Mug", "price": 5, "rating": 9.3 });
        assert_eq!(
            map_external_product(&raw).expect("maps").rating,
            Decimal::from(5)
        );
    }

    #[test]
    fn single_string_gallery_promotes_to_list() {
        let raw = json!({ "title": "Mug", "price": 5, "images": "https://cdn.example.com/a.jpg" });
        assert_eq!(map_external_product(&raw).expect("maps").images.len(), 1);
    }

    #[test]
    fn unknown_availability_status_keeps_default() {
        let raw = json!({ "title": "Mug", "price": 5, "availabilityStatus": "Gone" });
        assert_eq!(
            map_external_product(&raw).expect("maps").availability_status,
            "In Stock"
        );
    }

    #[test]
    fn dimensions_and_meta_nest() {
        let raw = json!({
            "title": "Crate",
            "price": 30,
            "dimensions": { "width": 10.5, "height": 4, "depth": 2 },
            "meta": { "barcode": "0123456789", "qrCode": "https://qr.example.com/x" },
        });
        let draft = map_external_product(&raw).expect("maps");
        assert_eq!(draft.width, Decimal::from_f64(10.5));
        assert_eq!(draft.barcode.as_deref(), Some("0123456789"));
        assert_eq!(draft.qr_code.as_deref(), Some("https://qr.example.com/x"));
    }
}
