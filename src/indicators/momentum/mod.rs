//! Momentum indicators: Williams %R

pub mod williams_r;

pub use williams_r::*;
