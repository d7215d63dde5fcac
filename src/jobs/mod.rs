//! Job system for per-symbol evaluation and per-date ranking

pub mod context;
pub mod handlers;
pub mod types;
pub mod workflow;

pub use context::JobContext;
pub use types::{EvaluateSymbolJob, RankDateJob};
pub use workflow::{BatchReport, RankingSummary, SymbolFailure, SymbolOutcome};
