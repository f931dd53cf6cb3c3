//! Product domain types shared by the API, importer, and CLI.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock availability labels accepted on product writes.
pub const AVAILABILITY_STATUSES: [&str; 4] =
    ["In Stock", "Out of Stock", "Backordered", "Discontinued"];

/// A validated product payload ready for persistence, produced by the
/// create/update handlers and by the bulk importer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
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
    pub is_featured: bool,
    pub is_best_seller: bool,
    pub rating: Decimal,
    pub reviews: serde_json::Value,
    pub barcode: Option<String>,
    pub qr_code: Option<String>,
}

impl ProductDraft {
    /// A draft with every optional field empty, for building up in tests
    /// and the importer.
    #[must_use]
    pub fn bare(title: &str, price: Decimal) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            short_description: None,
            price,
            discount_percentage: 0,
            category: String::new(),
            brand: String::new(),
            thumbnail: None,
            images: Vec::new(),
            stock: 0,
            sku: None,
            availability_status: "In Stock".to_string(),
            minimum_order_quantity: 1,
            tags: Vec::new(),
            colors: Vec::new(),
            sizes: Vec::new(),
            material: None,
            weight: None,
            width: None,
            height: None,
            depth: None,
            warranty_information: None,
            shipping_information: None,
            return_policy: None,
            is_new: false,
            is_featured: false,
            is_best_seller: false,
            rating: Decimal::ZERO,
            reviews: serde_json::Value::Array(Vec::new()),
            barcode: None,
            qr_code: None,
        }
    }
}

/// Whether a product counts as on sale.
///
/// Recomputed at every write boundary; client-supplied flags are ignored.
#[must_use]
pub fn derive_is_sale(
    discount_percentage: i16,
    explicit_sale_price: Option<Decimal>,
    price: Decimal,
) -> bool {
    discount_percentage > 0 || explicit_sale_price.is_some_and(|sp| sp < price)
}

/// Returns `true` when the label is one of [`AVAILABILITY_STATUSES`].
#[must_use]
pub fn is_valid_availability_status(label: &str) -> bool {
    AVAILABILITY_STATUSES.contains(&label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_implies_on_sale() {
        assert!(derive_is_sale(10, None, Decimal::new(5_000, 2)));
    }

    #[test]
    fn lower_explicit_sale_price_implies_on_sale() {
        assert!(derive_is_sale(
            0,
            Some(Decimal::new(4_000, 2)),
            Decimal::new(5_000, 2)
        ));
    }

    #[test]
    fn equal_or_higher_sale_price_is_not_a_sale() {
        assert!(!derive_is_sale(
            0,
            Some(Decimal::new(5_000, 2)),
            Decimal::new(5_000, 2)
        ));
        assert!(!derive_is_sale(
            0,
            Some(Decimal::new(6_000, 2)),
            Decimal::new(5_000, 2)
        ));
    }

    #[test]
    fn no_discount_no_sale_price_is_not_a_sale() {
        assert!(!derive_is_sale(0, None, Decimal::new(5_000, 2)));
    }

    #[test]
    fn availability_status_labels() {
        assert!(is_valid_availability_status("In Stock"));
        assert!(is_valid_availability_status("Backordered"));
        assert!(!is_valid_availability_status("in stock"));
        assert!(!is_valid_availability_status("Sold Out"));
    }
}
