//! Price comparison against area reference prices.
//!
//! The comparator normalizes an item name, asks a [`PriceSource`] for the
//! reference range, and falls back to a neutral range built from the paid
//! price when the source has nothing. It never fails.

use crate::models::{ComparisonSource, PriceComparison, PriceRange};
use std::sync::Arc;
use tracing::debug;

/// Supplier of reference price ranges.
///
/// `normalized_name` is already trimmed and lowercased. A real pricing service
/// can implement this without touching the comparator.
pub trait PriceSource: Send + Sync {
    /// Returns the reference range for an item, if known.
    fn lookup(&self, normalized_name: &str) -> Option<PriceRange>;
}

const AREA_PRICES: &[(&str, PriceRange)] = &[
    // Dairy
    ("milk", PriceRange::new(3.79, 2.99, 4.49)),
    ("eggs", PriceRange::new(4.29, 3.49, 5.99)),
    ("cheese", PriceRange::new(5.99, 4.49, 7.99)),
    ("butter", PriceRange::new(4.99, 3.99, 6.49)),
    ("yogurt", PriceRange::new(1.29, 0.99, 1.99)),
    // Produce
    ("bananas", PriceRange::new(0.59, 0.39, 0.79)),
    ("apples", PriceRange::new(1.99, 1.49, 2.99)),
    ("tomatoes", PriceRange::new(2.49, 1.99, 3.49)),
    ("lettuce", PriceRange::new(1.99, 1.49, 2.99)),
    ("carrots", PriceRange::new(1.49, 0.99, 2.29)),
    // Meat & Poultry
    ("chicken breast", PriceRange::new(4.99, 3.99, 6.99)),
    ("ground beef", PriceRange::new(5.49, 4.29, 7.99)),
    ("pork chops", PriceRange::new(4.29, 3.49, 5.99)),
    ("salmon", PriceRange::new(12.99, 9.99, 16.99)),
    // Pantry
    ("bread", PriceRange::new(2.99, 1.99, 4.99)),
    ("rice", PriceRange::new(3.49, 2.49, 4.99)),
    ("pasta", PriceRange::new(1.99, 1.29, 2.99)),
    ("cereal", PriceRange::new(4.49, 2.99, 6.99)),
    ("coffee", PriceRange::new(8.99, 5.99, 12.99)),
    // Household
    ("paper towels", PriceRange::new(7.99, 5.99, 9.99)),
    ("toilet paper", PriceRange::new(12.99, 9.99, 16.99)),
    ("dish soap", PriceRange::new(3.49, 2.49, 4.99)),
    ("laundry detergent", PriceRange::new(11.99, 8.99, 15.99)),
];

/// Fixed reference table, searched in declaration order.
#[derive(Debug, Clone)]
pub struct StaticPriceTable {
    entries: Vec<(String, PriceRange)>,
}

impl StaticPriceTable {
    /// Builds a table from `(name, range)` pairs. Names are normalized; order is kept.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, PriceRange)>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, range)| (normalize(name.as_ref()), range))
                .collect(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in search order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &PriceRange)> {
        self.entries.iter().map(|(name, range)| (name.as_str(), range))
    }
}

impl Default for StaticPriceTable {
    fn default() -> Self {
        Self::new(AREA_PRICES.iter().copied())
    }
}

impl PriceSource for StaticPriceTable {
    /// Exact match first, then the first key that contains the name or is
    /// contained in it.
    fn lookup(&self, normalized_name: &str) -> Option<PriceRange> {
        self.entries
            .iter()
            .find(|(key, _)| key == normalized_name)
            .or_else(|| {
                self.entries.iter().find(|(key, _)| {
                    normalized_name.contains(key.as_str()) || key.contains(normalized_name)
                })
            })
            .map(|(_, range)| *range)
    }
}

/// Compares receipt lines against a [`PriceSource`].
#[derive(Clone)]
pub struct PriceComparator {
    source: Arc<dyn PriceSource>,
}

impl std::fmt::Debug for PriceComparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceComparator").finish_non_exhaustive()
    }
}

impl Default for PriceComparator {
    fn default() -> Self {
        Self::new(Arc::new(StaticPriceTable::default()))
    }
}

impl PriceComparator {
    /// Creates a comparator backed by `source`.
    #[must_use]
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    /// Compares one item against its reference range.
    ///
    /// Unknown items compare against a range centered on their own price, so
    /// they always report zero savings.
    #[must_use]
    pub fn compare(&self, item_name: &str, actual_price: f64, category: &str) -> PriceComparison {
        let normalized = normalize(item_name);
        let range = self.source.lookup(&normalized).unwrap_or_else(|| {
            debug!("No reference price for '{normalized}', using neutral range");
            PriceRange::around(actual_price)
        });

        let savings = range.average - actual_price;
        let percentage_saved = if range.average == 0.0 {
            0.0
        } else {
            (savings / range.average) * 100.0
        };

        PriceComparison {
            item_name: item_name.to_string(),
            category: category.to_string(),
            actual_price,
            average_price: range.average,
            lowest_price: range.low,
            highest_price: range.high,
            savings,
            percentage_saved,
            source: ComparisonSource::AreaAverage,
        }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_exact_match_is_case_and_space_insensitive() {
        let comparator = PriceComparator::default();
        let comparison = comparator.compare("  MILK ", 3.29, "Dairy");

        assert_eq!(comparison.item_name, "  MILK ");
        assert_eq!(comparison.average_price, 3.79);
        assert_eq!(comparison.lowest_price, 2.99);
        assert_eq!(comparison.highest_price, 4.49);
        assert!((comparison.savings - 0.50).abs() < EPSILON);
        assert_eq!(comparison.source, ComparisonSource::AreaAverage);
    }

    #[test]
    fn test_item_name_containing_key() {
        let comparator = PriceComparator::default();
        let comparison = comparator.compare("Organic Bananas", 0.49, "Produce");
        assert_eq!(comparison.average_price, 0.59);
        assert!((comparison.savings - 0.10).abs() < EPSILON);
    }

    #[test]
    fn test_key_containing_item_name() {
        let comparator = PriceComparator::default();
        let comparison = comparator.compare("detergent", 13.99, "Household");
        assert_eq!(comparison.average_price, 11.99);
        assert!(comparison.savings < 0.0);
        assert!(comparison.percentage_saved < 0.0);
    }

    #[test]
    fn test_substring_match_uses_declaration_order() {
        // "milk chocolate cereal" contains both "milk" and "cereal"; milk is declared first
        let comparator = PriceComparator::default();
        let comparison = comparator.compare("milk chocolate cereal", 4.00, "Pantry");
        assert_eq!(comparison.average_price, 3.79);
    }

    #[test]
    fn test_unknown_item_is_neutral() {
        let comparator = PriceComparator::default();
        let comparison = comparator.compare("widget", 9.99, "Other");

        assert_eq!(comparison.average_price, 9.99);
        assert_eq!(comparison.savings, 0.0);
        assert_eq!(comparison.percentage_saved, 0.0);
        assert!((comparison.lowest_price - 9.99 * 0.8).abs() < EPSILON);
        assert!((comparison.highest_price - 9.99 * 1.2).abs() < EPSILON);
    }

    #[test]
    fn test_unknown_free_item_has_zero_percentage() {
        let comparator = PriceComparator::default();
        let comparison = comparator.compare("sample", 0.0, "Other");
        assert_eq!(comparison.savings, 0.0);
        assert_eq!(comparison.percentage_saved, 0.0);
    }

    #[test]
    fn test_custom_source() {
        struct Fixed;
        impl PriceSource for Fixed {
            fn lookup(&self, normalized_name: &str) -> Option<PriceRange> {
                (normalized_name == "tea").then_some(PriceRange::new(5.0, 4.0, 6.0))
            }
        }

        let comparator = PriceComparator::new(Arc::new(Fixed));
        let comparison = comparator.compare("Tea", 4.0, "Pantry");
        assert_eq!(comparison.savings, 1.0);
        assert_eq!(comparison.percentage_saved, 20.0);
    }

    #[test]
    fn test_builtin_table_ranges_are_ordered() {
        let table = StaticPriceTable::default();
        assert_eq!(table.len(), 23);
        for (name, range) in table.entries() {
            assert!(range.low <= range.average, "{name}: low above average");
            assert!(range.average <= range.high, "{name}: average above high");
        }
    }

    fn table_item() -> impl Strategy<Value = String> {
        let names: Vec<String> = StaticPriceTable::default()
            .entries()
            .map(|(name, _)| name.to_string())
            .collect();
        proptest::sample::select(names)
    }

    proptest! {
        #[test]
        fn prop_table_matches_keep_range_ordering(
            name in table_item(),
            prefix in "[a-z]{0,6}",
            price in 0.0f64..100.0,
        ) {
            let comparator = PriceComparator::default();
            let comparison = comparator.compare(&format!("{prefix} {name}"), price, "Any");
            prop_assert!(comparison.lowest_price <= comparison.average_price);
            prop_assert!(comparison.average_price <= comparison.highest_price);
        }

        #[test]
        fn prop_unknown_items_never_save(price in 0.0f64..1000.0) {
            let comparator = PriceComparator::default();
            let comparison = comparator.compare("zzqx gadget", price, "Other");
            prop_assert_eq!(comparison.savings, 0.0);
            prop_assert_eq!(comparison.percentage_saved, 0.0);
        }
    }
}
