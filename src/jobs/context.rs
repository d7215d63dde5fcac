//! Job context for dependency injection

use crate::config::EngineConfig;
use crate::db::IndicatorStore;
use crate::metrics::Metrics;
use std::sync::Arc;

/// Shared by every job of a run:
/// - Store (prices in, readings/rankings/alerts out)
/// - Engine configuration
/// - Metrics, when the binary exports them
pub struct JobContext {
    pub store: Arc<dyn IndicatorStore>,
    pub config: Arc<EngineConfig>,
    pub metrics: Option<Arc<Metrics>>,
}

impl JobContext {
    pub fn new(
        store: Arc<dyn IndicatorStore>,
        config: Arc<EngineConfig>,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            store,
            config,
            metrics,
        }
    }
}
