use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Timestamp format used for history entries, e.g. `2024-03-01-09-30`.
pub const HISTORY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M";

pub fn history_timestamp(at: DateTime<Local>) -> String {
    at.format(HISTORY_TIMESTAMP_FORMAT).to_string()
}

/// One row of the item sheet, validated and ready to track.
///
/// Immutable after load; all run-to-run state lives in the history store.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem {
    pub name: String,
    pub link: String,
    /// Lowercased site identifier used for the selector lookup.
    pub site: String,
    pub price_limit: f64,
}

/// The two content-locating selectors for a site: regular price and sale price.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SelectorPair {
    #[sqlx(rename = "selector")]
    pub primary: String,
    #[sqlx(rename = "selector_sale")]
    pub sale: String,
}

/// Persisted per-item state in the history file.
///
/// `notification` starts true and flips to false once a threshold alert has
/// fired; it never flips back, so an item alerts at most once across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Append-only `(timestamp, price)` observations, insertion order.
    pub price: Vec<(String, f64)>,
    pub notification: bool,
    pub link: String,
}

impl PriceRecord {
    pub fn new(link: String) -> Self {
        Self {
            price: Vec::new(),
            notification: true,
            link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_history_timestamp_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 45).unwrap();
        assert_eq!(history_timestamp(at), "2024-03-01-09-30");
    }

    #[test]
    fn test_fresh_record_is_armed_and_empty() {
        let record = PriceRecord::new("https://shop.example/widget".to_string());
        assert!(record.notification);
        assert!(record.price.is_empty());
        assert_eq!(record.link, "https://shop.example/widget");
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = PriceRecord::new("https://shop.example/widget".to_string());
        record.price.push(("2024-03-01-09-30".to_string(), 9.99));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["price"][0][0], "2024-03-01-09-30");
        assert_eq!(json["price"][0][1], 9.99);
        assert_eq!(json["notification"], true);
        assert_eq!(json["link"], "https://shop.example/widget");
    }
}
