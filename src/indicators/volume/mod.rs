//! Volume-flow indicators: Force Index, anchored OBV

pub mod force_index;
pub mod obv;

pub use force_index::*;
pub use obv::*;
