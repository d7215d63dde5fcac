//! Services that prepare price series before evaluation

pub mod conversion;

pub use conversion::BasePriceCache;
