pub mod error;
pub mod resample;

pub mod momentum;
pub mod trend;
pub mod volume;

pub use error::IndicatorError;
pub use resample::{complete_bars, to_weekly};
