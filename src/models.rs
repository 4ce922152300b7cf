//! Data model shared by the comparator, the ledger and the goal tracker.
//!
//! Every persisted struct serializes with camelCase field names so the JSON
//! stored under the ledger keys keeps the same shape the mobile app writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse location pulled out of receipt text. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLocation {
    /// County name; no extractor currently fills this in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    /// Five-digit ZIP code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Two-letter state abbreviation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// City name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Store name as reported by the capture pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// Street address line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
}

/// Reference price range for one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    /// Typical price in the area
    pub average: f64,
    /// Lowest observed price
    pub low: f64,
    /// Highest observed price
    pub high: f64,
}

impl PriceRange {
    /// Creates a range from its three prices.
    #[must_use]
    pub const fn new(average: f64, low: f64, high: f64) -> Self {
        Self { average, low, high }
    }

    /// Neutral range used when no reference price is known: the paid price is
    /// the average, with a 20% band either side.
    #[must_use]
    pub fn around(actual_price: f64) -> Self {
        Self {
            average: actual_price,
            low: actual_price * 0.8,
            high: actual_price * 1.2,
        }
    }
}

/// Where the baseline of a comparison came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonSource {
    /// Area reference table
    #[default]
    AreaAverage,
    /// The user's own purchase history (reserved)
    Historical,
    /// Other stores the user shops at (reserved)
    OtherStores,
}

/// Outcome of comparing one receipt line against its reference range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceComparison {
    /// Item name exactly as it appeared on the receipt
    pub item_name: String,
    /// Category supplied by the capture pipeline
    pub category: String,
    /// Price the user paid
    pub actual_price: f64,
    /// Reference average
    pub average_price: f64,
    /// Reference low
    pub lowest_price: f64,
    /// Reference high
    pub highest_price: f64,
    /// `average_price - actual_price`; positive when the user paid less
    pub savings: f64,
    /// Savings as a percentage of the average
    pub percentage_saved: f64,
    /// Baseline used for this comparison
    pub source: ComparisonSource,
}

/// One receipt line handed over by the capture pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    /// Item name as printed
    pub name: String,
    /// Price paid
    pub price: f64,
    /// Category label
    pub category: String,
}

impl ReceiptItem {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, price: f64, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price,
            category: category.into(),
        }
    }
}

/// Savings split by baseline.
///
/// Only `vs_area_average` is computed today. `vs_historical` and
/// `vs_other_stores` are always `0.0` and must be read as "not yet computed",
/// not as "no savings".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsBreakdown {
    /// Savings against the area reference table
    pub vs_area_average: f64,
    /// Reserved, always zero
    pub vs_historical: f64,
    /// Reserved, always zero
    pub vs_other_stores: f64,
}

/// Savings record for one scanned receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsLog {
    /// Unique, time-ordered identifier
    pub id: String,
    /// Identifier of the receipt in the capture pipeline
    pub receipt_id: String,
    /// When the receipt was processed
    pub date: DateTime<Utc>,
    /// Store the receipt came from
    pub store_name: String,
    /// Location extracted from the receipt text
    pub location: ReceiptLocation,
    /// Sum of `actual_price` over `item_comparisons`
    pub total_spent: f64,
    /// Sum of `savings` over `item_comparisons`
    pub total_savings: f64,
    /// One comparison per receipt line, in receipt order
    pub item_comparisons: Vec<PriceComparison>,
    /// Savings per baseline
    pub savings_breakdown: SavingsBreakdown,
}

/// Savings summed for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySavings {
    /// Category label
    pub category: String,
    /// Summed savings (may be negative)
    pub saved: f64,
}

/// Rollup of the calendar week containing a reference instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySavings {
    /// Sunday 00:00 local time, inclusive
    pub week_start: DateTime<Utc>,
    /// Following Sunday 00:00 local time, exclusive
    pub week_end: DateTime<Utc>,
    /// Summed savings of the week's receipts
    pub total_saved: f64,
    /// Summed spending of the week's receipts
    pub total_spent: f64,
    /// Number of receipts in the week
    pub receipts_count: usize,
    /// Comparison with the largest positive savings, if any
    pub best_deal: Option<PriceComparison>,
    /// Up to five categories, highest savings first
    pub top_savings_categories: Vec<CategorySavings>,
}

/// Length of a savings goal period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    /// Seven days from the start date
    Weekly,
    /// One calendar month from the start date
    Monthly,
}

/// Which purchases a goal counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    /// Grocery purchases only
    #[default]
    Groceries,
    /// Every purchase
    All,
}

/// A user-defined savings target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoal {
    /// Unique identifier
    pub id: String,
    /// Period length
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    /// Amount to save, always positive
    pub target_amount: f64,
    /// Amount credited so far
    pub current_saved: f64,
    /// Local midnight of the creation day
    pub start_date: DateTime<Utc>,
    /// End of the period, exclusive
    pub end_date: DateTime<Utc>,
    /// Which purchases count
    pub category: GoalCategory,
    /// Whether the goal is still being tracked
    pub is_active: bool,
}

/// Derived view of how a goal is going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    /// The goal being reported on
    pub goal: SavingsGoal,
    /// Percentage of the target reached, clamped to 0..=100
    pub percent_complete: f64,
    /// Whole days left in the period
    pub days_remaining: i64,
    /// Whether the current daily rate reaches the target by the end date
    pub on_track: bool,
    /// Savings expected at the end date at the current rate
    pub projected_savings: f64,
    /// Savings per elapsed day
    pub average_daily_savings: f64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_price_comparison_wire_format() {
        let comparison = PriceComparison {
            item_name: "milk".to_string(),
            category: "Dairy".to_string(),
            actual_price: 3.29,
            average_price: 3.79,
            lowest_price: 2.99,
            highest_price: 4.49,
            savings: 0.5,
            percentage_saved: 13.19,
            source: ComparisonSource::AreaAverage,
        };

        let json = serde_json::to_value(&comparison).unwrap();
        assert_eq!(json["itemName"], "milk");
        assert_eq!(json["actualPrice"], 3.29);
        assert_eq!(json["source"], "area_average");
    }

    #[test]
    fn test_goal_reads_app_json() {
        let json = r#"{
            "id": "goal_1700000000000",
            "type": "weekly",
            "targetAmount": 150,
            "currentSaved": 12.5,
            "startDate": "2024-03-10T08:00:00.000Z",
            "endDate": "2024-03-17T07:00:00.000Z",
            "category": "groceries",
            "isActive": true
        }"#;

        let goal: SavingsGoal = serde_json::from_str(json).unwrap();
        assert_eq!(goal.goal_type, GoalType::Weekly);
        assert_eq!(goal.target_amount, 150.0);
        assert_eq!(goal.category, GoalCategory::Groceries);
        assert!(goal.is_active);
    }

    #[test]
    fn test_empty_location_serializes_to_empty_object() {
        let json = serde_json::to_string(&ReceiptLocation::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_price_range_around() {
        let range = PriceRange::around(10.0);
        assert_eq!(range.average, 10.0);
        assert_eq!(range.low, 8.0);
        assert_eq!(range.high, 12.0);
    }
}
