//! Core business logic - framework-agnostic savings operations.

/// Calendar arithmetic for weeks and goal periods
pub mod calendar;
/// Savings goals and progress projection
pub mod goals;
/// Savings log persistence and aggregation
pub mod ledger;
/// Location extraction from receipt text
pub mod location;
/// Reference price lookup and comparison
pub mod pricing;

pub use goals::{GoalTracker, progress, status_message};
pub use ledger::SavingsLedger;
pub use location::extract_location;
pub use pricing::{PriceComparator, PriceSource, StaticPriceTable};
