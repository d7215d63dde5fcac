//! Core application primitives (orchestrators)

pub mod runtime;

pub use runtime::*;
