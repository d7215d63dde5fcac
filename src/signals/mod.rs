//! Alert composition and the per-date alert ledger

pub mod aggregation;
pub mod ledger;

pub use aggregation::{AlertAggregator, AlertInputs};
pub use ledger::merge_alerts;
