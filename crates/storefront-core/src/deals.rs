//! Deal lifecycle evaluation and discount arithmetic.
//!
//! A deal's status is never stored. It is a pure function of the evaluation
//! instant and the deal's window, recomputed on every read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Temporal status of a deal at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Scheduled,
    Active,
    Expired,
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealStatus::Scheduled => write!(f, "scheduled"),
            DealStatus::Active => write!(f, "active"),
            DealStatus::Expired => write!(f, "expired"),
        }
    }
}

/// The inputs that determine a deal's status, detached from any storage row.
#[derive(Debug, Clone, Copy)]
pub struct DealWindow {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

/// Classify a deal window at `now`.
///
/// A deactivated deal is expired regardless of its dates. Otherwise the
/// classification is a total order with no ties: before the window is
/// scheduled, after it is expired, inside it (endpoints inclusive) is active.
#[must_use]
pub fn evaluate(window: &DealWindow, now: DateTime<Utc>) -> DealStatus {
    if !window.is_active {
        return DealStatus::Expired;
    }
    if now < window.start_date {
        DealStatus::Scheduled
    } else if now > window.end_date {
        DealStatus::Expired
    } else {
        DealStatus::Active
    }
}

/// Price after applying a percentage discount, rounded to 2 decimal places
/// for display.
#[must_use]
pub fn sale_price(price: Decimal, discount_percentage: i16) -> Decimal {
    let pct = Decimal::from(discount_percentage);
    let mut result = (price * (Decimal::ONE_HUNDRED - pct) / Decimal::ONE_HUNDRED).round_dp(2);
    // Whole-dollar results still display with cents.
    result.rescale(2);
    result
}

/// How much a buyer saves at the discounted price.
#[must_use]
pub fn amount_saved(price: Decimal, discount_percentage: i16) -> Decimal {
    price - sale_price(price, discount_percentage)
}

/// Sort key for choosing which active deal to surface on the storefront:
/// featured deals first, then the one ending soonest.
///
/// Sort ascending by this key and take the first element.
#[must_use]
pub fn spotlight_rank(featured: bool, end_date: DateTime<Utc>) -> (bool, DateTime<Utc>) {
    (!featured, end_date)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, hour, 0, 0).unwrap()
    }

    fn window(start_hour: u32, end_hour: u32) -> DealWindow {
        DealWindow {
            start_date: at(start_hour),
            end_date: at(end_hour),
            is_active: true,
        }
    }

    #[test]
    fn before_start_is_scheduled() {
        assert_eq!(evaluate(&window(10, 14), at(9)), DealStatus::Scheduled);
    }

    #[test]
    fn inside_window_is_active() {
        assert_eq!(evaluate(&window(10, 14), at(12)), DealStatus::Active);
    }

    #[test]
    fn window_endpoints_are_active() {
        assert_eq!(evaluate(&window(10, 14), at(10)), DealStatus::Active);
        assert_eq!(evaluate(&window(10, 14), at(14)), DealStatus::Active);
    }

    #[test]
    fn after_end_is_expired() {
        assert_eq!(evaluate(&window(10, 14), at(15)), DealStatus::Expired);
    }

    #[test]
    fn deactivated_deal_is_expired_even_inside_window() {
        let mut w = window(10, 14);
        w.is_active = false;
        assert_eq!(evaluate(&w, at(12)), DealStatus::Expired);
    }

    #[test]
    fn status_is_monotonic_as_time_advances() {
        let w = window(10, 14);
        let mut last = evaluate(&w, at(0));
        let mut t = at(0);
        while t < at(23) {
            let next = evaluate(&w, t);
            let regressed = matches!(
                (last, next),
                (DealStatus::Active, DealStatus::Scheduled)
                    | (DealStatus::Expired, DealStatus::Active | DealStatus::Scheduled)
            );
            assert!(!regressed, "status regressed from {last} to {next} at {t}");
            last = next;
            t = t + Duration::minutes(7);
        }
    }

    #[test]
    fn sale_price_applies_percentage() {
        assert_eq!(
            sale_price(Decimal::new(10_000, 2), 20),
            Decimal::new(8_000, 2)
        );
    }

    #[test]
    fn sale_price_rounds_to_cents() {
        // 99.99 at 15% off = 84.9915 -> 84.99
        assert_eq!(sale_price(Decimal::new(9_999, 2), 15), Decimal::new(8_499, 2));
    }

    #[test]
    fn zero_discount_leaves_price_unchanged() {
        let price = Decimal::new(4_250, 2);
        assert_eq!(sale_price(price, 0), price);
    }

    #[test]
    fn sale_price_never_exceeds_price() {
        let price = Decimal::new(1_234, 2);
        for pct in 0..=100 {
            assert!(sale_price(price, pct) <= price, "pct={pct}");
        }
    }

    #[test]
    fn amount_saved_is_price_minus_sale_price() {
        let price = Decimal::new(10_000, 2);
        assert_eq!(amount_saved(price, 25), Decimal::new(2_500, 2));
    }

    #[test]
    fn spotlight_prefers_featured_then_soonest_ending() {
        let soon = at(10);
        let later = at(20);
        let mut deals = vec![
            ("plain-soon", spotlight_rank(false, soon)),
            ("featured-later", spotlight_rank(true, later)),
            ("featured-soon", spotlight_rank(true, soon)),
        ];
        deals.sort_by_key(|(_, rank)| *rank);
        assert_eq!(deals[0].0, "featured-soon");
        assert_eq!(deals[1].0, "featured-later");
        assert_eq!(deals[2].0, "plain-soon");
    }
}
