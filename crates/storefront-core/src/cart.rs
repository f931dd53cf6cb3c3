//! Cart snapshot totals.
//!
//! The cart itself lives with the client; the server only ever sees a
//! snapshot at checkout time and recomputes every amount from it. Client
//! totals are never trusted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a checkout cart snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// The price one unit actually sells for: the sale price when one is
    /// set below the list price, the list price otherwise.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        match self.sale_price {
            Some(sp) if sp < self.price => sp,
            _ => self.price,
        }
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }
}

/// Shipping and tax parameters applied to a cart subtotal.
#[derive(Debug, Clone, Copy)]
pub struct PricingRules {
    pub flat_shipping: Decimal,
    pub free_shipping_over: Decimal,
    /// Fractional rate, e.g. `0.08` for 8%.
    pub tax_rate: Decimal,
}

/// The derived amounts for an order, all rounded to cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total: Decimal,
}

/// Sum of line totals.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Decimal {
    let mut sum = items
        .iter()
        .map(CartItem::line_total)
        .sum::<Decimal>()
        .round_dp(2);
    sum.rescale(2);
    sum
}

/// Compute the full amount breakdown for a cart snapshot.
#[must_use]
pub fn totals(items: &[CartItem], rules: &PricingRules) -> CartTotals {
    let items_price = subtotal(items);
    let shipping_price = if items_price >= rules.free_shipping_over || items.is_empty() {
        Decimal::ZERO
    } else {
        rules.flat_shipping
    };
    let mut tax_price = (items_price * rules.tax_rate).round_dp(2);
    tax_price.rescale(2);
    let mut total = items_price + shipping_price + tax_price;
    total.rescale(2);
    CartTotals {
        items_price,
        shipping_price,
        tax_price,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price_cents: i64, sale_cents: Option<i64>, quantity: u32) -> CartItem {
        CartItem {
            product_id: 1,
            name: "Mug".to_string(),
            price: Decimal::new(price_cents, 2),
            sale_price: sale_cents.map(|c| Decimal::new(c, 2)),
            image: None,
            quantity,
        }
    }

    fn rules() -> PricingRules {
        PricingRules {
            flat_shipping: Decimal::new(1_000, 2),
            free_shipping_over: Decimal::new(10_000, 2),
            tax_rate: Decimal::new(8, 2),
        }
    }

    #[test]
    fn unit_price_prefers_lower_sale_price() {
        assert_eq!(item(2_000, Some(1_500), 1).unit_price(), Decimal::new(1_500, 2));
    }

    #[test]
    fn unit_price_ignores_sale_price_at_or_above_list() {
        assert_eq!(item(2_000, Some(2_000), 1).unit_price(), Decimal::new(2_000, 2));
        assert_eq!(item(2_000, Some(2_500), 1).unit_price(), Decimal::new(2_000, 2));
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let items = vec![item(2_000, None, 2), item(1_000, Some(500), 3)];
        assert_eq!(subtotal(&items), Decimal::new(5_500, 2));
    }

    #[test]
    fn flat_shipping_below_threshold() {
        let t = totals(&[item(2_000, None, 1)], &rules());
        assert_eq!(t.shipping_price, Decimal::new(1_000, 2));
    }

    #[test]
    fn free_shipping_at_threshold() {
        let t = totals(&[item(10_000, None, 1)], &rules());
        assert_eq!(t.shipping_price, Decimal::ZERO);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let t = totals(&[], &rules());
        assert_eq!(t.total, Decimal::ZERO);
        assert_eq!(t.shipping_price, Decimal::ZERO);
    }

    #[test]
    fn tax_applies_to_items_only() {
        // 20.00 items, 10.00 shipping, 8% tax on items = 1.60
        let t = totals(&[item(2_000, None, 1)], &rules());
        assert_eq!(t.tax_price, Decimal::new(160, 2));
        assert_eq!(t.total, Decimal::new(3_160, 2));
    }
}
