//! Order number formatting.

use chrono::NaiveDate;

/// Format a human-readable order number: `ORD-YYMMDD-NNNN`.
///
/// `sequence` is the 1-based position of the order within the UTC day;
/// values past 9999 widen rather than wrap, keeping numbers unique.
#[must_use]
pub fn format_order_number(day: NaiveDate, sequence: i64) -> String {
    format!("ORD-{}-{sequence:04}", day.format("%y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn formats_date_and_padded_sequence() {
        assert_eq!(format_order_number(day(), 1), "ORD-250615-0001");
        assert_eq!(format_order_number(day(), 427), "ORD-250615-0427");
    }

    #[test]
    fn sequence_past_padding_widens() {
        assert_eq!(format_order_number(day(), 12345), "ORD-250615-12345");
    }

    #[test]
    fn matches_expected_shape() {
        let n = format_order_number(day(), 7);
        assert_eq!(n.len(), "ORD-YYMMDD-NNNN".len());
        assert!(n.starts_with("ORD-"));
    }
}
