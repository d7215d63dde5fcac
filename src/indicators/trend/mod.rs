//! Trend indicators: Heikin-Ashi

pub mod heikin_ashi;

pub use heikin_ashi::*;
