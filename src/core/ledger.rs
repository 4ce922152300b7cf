//! Savings ledger business logic.
//!
//! Turns processed receipts into [`SavingsLog`] records, keeps them in a capped
//! append-only collection, and answers the read queries the savings dashboard
//! needs: all logs, the weekly rollup, best deal and per-category totals.
//! Storage failures follow the configured [`FailurePolicy`].

use crate::{
    config::LedgerConfig,
    core::{calendar, location::extract_location, pricing::PriceComparator},
    errors::Result,
    models::{
        CategorySavings, PriceComparison, ReceiptItem, ReceiptLocation, SavingsBreakdown,
        SavingsLog, WeeklySavings,
    },
    storage::{FailurePolicy, JsonCollection, KeyValueStore, PRICE_HISTORY_KEY, SAVINGS_LOG_KEY},
};
use chrono::{DateTime, Local, TimeZone, Utc};
use std::{collections::HashMap, fmt::Write as _, sync::Arc};
use tracing::{info, instrument};
use uuid::Uuid;

/// Capped, persisted log of per-receipt savings.
#[derive(Debug, Clone)]
pub struct SavingsLedger {
    logs: JsonCollection<SavingsLog>,
    comparator: PriceComparator,
    policy: FailurePolicy,
    retention_cap: usize,
    significant_difference: f64,
    top_categories: usize,
}

impl SavingsLedger {
    /// Creates a ledger over `store` using the settings and reference table in `config`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: &LedgerConfig) -> Self {
        Self {
            logs: JsonCollection::new(store, SAVINGS_LOG_KEY),
            comparator: PriceComparator::new(Arc::new(config.price_table())),
            policy: config.failure_policy,
            retention_cap: config.retention_cap,
            significant_difference: config.significant_difference,
            top_categories: config.top_categories,
        }
    }

    /// Replaces the comparator, e.g. to plug in a different
    /// [`PriceSource`](crate::core::pricing::PriceSource).
    #[must_use]
    pub fn with_comparator(mut self, comparator: PriceComparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Builds a savings log for a receipt without persisting it.
    ///
    /// `store_name` is copied into the log's location. Comparisons keep the
    /// order of `items`.
    #[must_use]
    pub fn build_log(
        &self,
        receipt_id: &str,
        store_name: &str,
        items: &[ReceiptItem],
        raw_text: Option<&str>,
        now: DateTime<Utc>,
    ) -> SavingsLog {
        let mut location = raw_text.map(extract_location).unwrap_or_default();
        location.store_name = Some(store_name.to_string());

        let item_comparisons: Vec<PriceComparison> = items
            .iter()
            .map(|item| self.comparator.compare(&item.name, item.price, &item.category))
            .collect();

        let total_spent = item_comparisons.iter().map(|c| c.actual_price).sum();
        let total_savings = item_comparisons.iter().map(|c| c.savings).sum();

        SavingsLog {
            id: format!("savings_{}", Uuid::now_v7()),
            receipt_id: receipt_id.to_string(),
            date: now,
            store_name: store_name.to_string(),
            location,
            total_spent,
            total_savings,
            item_comparisons,
            savings_breakdown: SavingsBreakdown {
                vs_area_average: total_savings,
                ..SavingsBreakdown::default()
            },
        }
    }

    /// Compares a receipt against reference prices and appends the result to
    /// the ledger, dated now.
    pub async fn record_receipt(
        &self,
        receipt_id: &str,
        store_name: &str,
        items: &[ReceiptItem],
        raw_text: Option<&str>,
    ) -> Result<SavingsLog> {
        self.record_receipt_at(receipt_id, store_name, items, raw_text, Utc::now())
            .await
    }

    /// Same as [`record_receipt`](Self::record_receipt) with an explicit date.
    ///
    /// The oldest logs are dropped once the ledger holds more than the
    /// retention cap. Under the swallow policy the log is returned even if it
    /// could not be persisted.
    ///
    /// # Arguments
    /// * `receipt_id` - ID of the processed receipt
    /// * `store_name` - Store the receipt came from
    /// * `items` - Purchased items, compared in order
    /// * `raw_text` - OCR text to pull the store location from, if any
    /// * `now` - Date recorded on the log
    ///
    /// # Returns
    /// The new `SavingsLog`
    #[instrument(skip(self, items, raw_text), fields(item_count = items.len()))]
    pub async fn record_receipt_at(
        &self,
        receipt_id: &str,
        store_name: &str,
        items: &[ReceiptItem],
        raw_text: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SavingsLog> {
        let log = self.build_log(receipt_id, store_name, items, raw_text, now);

        let record = log.clone();
        let cap = self.retention_cap;
        let saved = self
            .logs
            .update(move |logs| {
                logs.push(record);
                let overflow = logs.len().saturating_sub(cap);
                logs.drain(..overflow);
                overflow
            })
            .await
            .map(|evicted| {
                info!(
                    "Savings log saved: {}, total saved: ${:.2}, evicted {}",
                    log.id, log.total_savings, evicted
                );
            });

        self.policy
            .apply(saved, "Failed to save savings log", || ())?;
        Ok(log)
    }

    /// Every persisted log, oldest first.
    pub async fn get_all_logs(&self) -> Result<Vec<SavingsLog>> {
        self.policy.apply(
            self.logs.load().await,
            "Failed to load savings logs",
            Vec::new,
        )
    }

    /// Rollup of the current calendar week in local time.
    pub async fn get_weekly_savings(&self) -> Result<WeeklySavings> {
        self.get_weekly_savings_at(&Local::now()).await
    }

    /// Rollup of the calendar week (Sunday to Sunday, in the time zone of
    /// `now`) that contains `now`.
    pub async fn get_weekly_savings_at<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> Result<WeeklySavings> {
        let (week_start, week_end) = calendar::week_bounds(now);
        let logs = self.get_all_logs().await?;
        Ok(summarize_week(
            &logs,
            week_start,
            week_end,
            self.top_categories,
        ))
    }

    /// The single best deal across the whole ledger.
    pub async fn get_best_deal(&self) -> Result<Option<PriceComparison>> {
        let logs = self.get_all_logs().await?;
        Ok(best_deal(&logs))
    }

    /// Savings per category across the whole ledger, highest first.
    pub async fn get_category_totals(&self) -> Result<Vec<CategorySavings>> {
        let logs = self.get_all_logs().await?;
        Ok(category_totals(&logs))
    }

    /// Human-readable "how is this calculated" text for one log.
    #[must_use]
    pub fn explain(&self, log: &SavingsLog) -> String {
        explain_savings(log, self.significant_difference)
    }

    /// Deletes all persisted savings data.
    pub async fn clear(&self) -> Result<()> {
        let result = async {
            self.logs.remove().await?;
            self.logs.store().remove(PRICE_HISTORY_KEY).await
        }
        .await;

        self.policy
            .apply(result, "Failed to clear savings data", || ())?;
        info!("Savings data cleared");
        Ok(())
    }
}

/// Aggregates the logs dated in `[week_start, week_end)`.
///
/// # Arguments
/// * `logs` - Logs to scan, in ledger order
/// * `week_start` - Inclusive start of the week
/// * `week_end` - Exclusive end of the week
/// * `top_categories` - How many categories to keep in the rollup
///
/// # Returns
/// A `WeeklySavings` with totals, receipt count, best deal and top categories
#[must_use]
pub fn summarize_week(
    logs: &[SavingsLog],
    week_start: DateTime<Utc>,
    week_end: DateTime<Utc>,
    top_categories: usize,
) -> WeeklySavings {
    let week_logs: Vec<SavingsLog> = logs
        .iter()
        .filter(|log| log.date >= week_start && log.date < week_end)
        .cloned()
        .collect();

    let mut categories = category_totals(&week_logs);
    categories.truncate(top_categories);

    WeeklySavings {
        week_start,
        week_end,
        total_saved: week_logs.iter().map(|log| log.total_savings).sum(),
        total_spent: week_logs.iter().map(|log| log.total_spent).sum(),
        receipts_count: week_logs.len(),
        best_deal: best_deal(&week_logs),
        top_savings_categories: categories,
    }
}

/// Comparison with the highest strictly positive savings; the first one wins ties.
#[must_use]
pub fn best_deal(logs: &[SavingsLog]) -> Option<PriceComparison> {
    let mut best: Option<&PriceComparison> = None;
    for comparison in logs.iter().flat_map(|log| &log.item_comparisons) {
        if comparison.savings > best.map_or(0.0, |b| b.savings) {
            best = Some(comparison);
        }
    }
    best.cloned()
}

/// Summed savings per category, highest first. Equal totals keep the order in
/// which their categories first appeared.
#[must_use]
pub fn category_totals(logs: &[SavingsLog]) -> Vec<CategorySavings> {
    let mut totals: Vec<CategorySavings> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for comparison in logs.iter().flat_map(|log| &log.item_comparisons) {
        if let Some(&i) = index.get(comparison.category.as_str()) {
            totals[i].saved += comparison.savings;
        } else {
            index.insert(comparison.category.as_str(), totals.len());
            totals.push(CategorySavings {
                category: comparison.category.clone(),
                saved: comparison.savings,
            });
        }
    }

    totals.sort_by(|a, b| b.saved.total_cmp(&a.saved));
    totals
}

/// Explanation text listing up to three items whose savings exceed
/// `threshold` in either direction.
#[must_use]
pub fn explain_savings(log: &SavingsLog, threshold: f64) -> String {
    let examples = log
        .item_comparisons
        .iter()
        .filter(|c| c.savings.abs() > threshold)
        .take(3)
        .map(|c| {
            let saved = c.savings > 0.0;
            format!(
                "{} {}: ${:.2}\n  vs. Average price: ${:.2}\n  You {}: ${:.2}",
                if saved { "✓" } else { "⚠️" },
                c.item_name,
                c.actual_price,
                c.average_price,
                if saved { "saved" } else { "paid" },
                c.savings.abs()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let ReceiptLocation {
        county, zip_code, ..
    } = &log.location;

    let mut text = String::from("💡 How We Calculate Savings\n\n");
    text.push_str("Ellio compares your receipt prices to:\n");
    let _ = writeln!(
        text,
        "1. Average prices in your area ({} + {})",
        county.as_deref().filter(|s| !s.is_empty()).unwrap_or("county"),
        zip_code.as_deref().filter(|s| !s.is_empty()).unwrap_or("ZIP")
    );
    text.push_str("2. Prices at other stores you've shopped\n");
    text.push_str("3. Historical prices for the same items\n\n");
    text.push_str(&examples);
    let _ = write!(
        text,
        "\n\nTotal across {} items: ${:.2}\n\n",
        log.item_comparisons.len(),
        log.total_savings
    );
    text.push_str("Data source: Your receipts + aggregated pricing data from your area (no GPS).");
    text
}
