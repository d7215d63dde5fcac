//! Environment-driven configuration
//!
//! Every value has a default so the worker starts with an empty environment.
//! Unparseable values fall back to the default instead of failing startup.

use crate::models::market::MarketKey;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Deployment environment (`APP_ENV`), defaults to `sandbox`
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

/// PostgreSQL connection string (`DATABASE_URL`)
pub fn get_database_url() -> String {
    env::var("DATABASE_URL")
        .unwrap_or_else(|_| "host=localhost user=postgres dbname=regime_alerts".to_string())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// How ties share a rank in the cross-sectional ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TiePolicy {
    /// Tied symbols all receive the best rank among them (1, 1, 3)
    #[default]
    Min,
    /// Tied symbols receive the mean of the ranks they span (1.5, 1.5, 3)
    Average,
}

impl FromStr for TiePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" => Ok(TiePolicy::Min),
            "average" | "avg" | "mean" => Ok(TiePolicy::Average),
            other => Err(format!("unknown tie policy: {}", other)),
        }
    }
}

/// Force Index state machine flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMode {
    /// INACTIVE / FRESH / CONTINUATION
    #[default]
    Continuation,
    /// INACTIVE / FRESH_UP / FRESH_DOWN
    Directional,
}

impl FromStr for CrossoverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuation" => Ok(CrossoverMode::Continuation),
            "directional" => Ok(CrossoverMode::Directional),
            other => Err(format!("unknown crossover mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WilliamsRConfig {
    pub lookback: usize,
    pub ema_length: usize,
    pub threshold: f64,
}

impl Default for WilliamsRConfig {
    fn default() -> Self {
        Self {
            lookback: 52,
            ema_length: 21,
            threshold: -50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceIndexConfig {
    pub fast: usize,
    pub slow: usize,
    pub mode: CrossoverMode,
}

impl ForceIndexConfig {
    /// Spans used for a market when nothing is overridden
    pub fn for_market(market: crate::models::market::Market) -> Self {
        use crate::models::market::Market;
        let (fast, slow) = match market {
            Market::India => (4, 14),
            Market::Us | Market::Crypto => (7, 52),
        };
        Self {
            fast,
            slow,
            mode: CrossoverMode::default(),
        }
    }
}

/// Settings shared by every engine and the batch runtime
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub williams_r: WilliamsRConfig,
    /// Replaces the per-market Force Index spans when set
    pub force_index_override: Option<(usize, usize)>,
    pub force_index_mode: CrossoverMode,
    pub tie_policy: TiePolicy,
    pub history_days: i64,
    pub max_weeks: usize,
    pub concurrency: usize,
    pub retry_attempts: usize,
    pub obv_requires_oversold: bool,
    pub derive_crypto_bases: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            williams_r: WilliamsRConfig::default(),
            force_index_override: None,
            force_index_mode: CrossoverMode::default(),
            tie_policy: TiePolicy::default(),
            history_days: 560,
            max_weeks: 80,
            concurrency: 8,
            retry_attempts: 3,
            obv_requires_oversold: true,
            derive_crypto_bases: true,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fast: Option<usize> = env::var("FORCE_INDEX_FAST").ok().and_then(|v| v.parse().ok());
        let slow: Option<usize> = env::var("FORCE_INDEX_SLOW").ok().and_then(|v| v.parse().ok());
        let force_index_override = match (fast, slow) {
            (Some(f), Some(s)) if f > 0 && f < s => Some((f, s)),
            _ => None,
        };

        Self {
            williams_r: defaults.williams_r,
            force_index_override,
            force_index_mode: env_or("FORCE_INDEX_MODE", defaults.force_index_mode),
            tie_policy: env_or("TIE_POLICY", defaults.tie_policy),
            history_days: env_or("HISTORY_DAYS", defaults.history_days),
            max_weeks: defaults.max_weeks,
            concurrency: env_or("WORKER_CONCURRENCY", defaults.concurrency).max(1),
            retry_attempts: env_or("RETRY_ATTEMPTS", defaults.retry_attempts),
            obv_requires_oversold: env_or("OBV_REQUIRES_OVERSOLD", defaults.obv_requires_oversold),
            derive_crypto_bases: env_or("DERIVE_CRYPTO_BASES", defaults.derive_crypto_bases),
        }
    }

    /// Force Index parameters for a market, honouring any override
    pub fn force_index(&self, market: crate::models::market::Market) -> ForceIndexConfig {
        let mut cfg = ForceIndexConfig::for_market(market);
        if let Some((fast, slow)) = self.force_index_override {
            cfg.fast = fast;
            cfg.slow = slow;
        }
        cfg.mode = self.force_index_mode;
        cfg
    }
}

/// Market keys to process (`MARKETS`), defaults to all of them
pub fn get_market_keys() -> Vec<MarketKey> {
    match env::var("MARKETS") {
        Ok(raw) => {
            let keys: Vec<MarketKey> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<MarketKey>() {
                    Ok(key) => Some(vec![key]),
                    // a bare "crypto" expands to every crypto base
                    Err(_) if s.eq_ignore_ascii_case("crypto") => Some(MarketKey::crypto()),
                    Err(e) => {
                        tracing::warn!(value = %s, error = %e, "Ignoring unknown market key");
                        None
                    }
                })
                .flatten()
                .collect();
            if keys.is_empty() {
                MarketKey::all()
            } else {
                keys
            }
        }
        Err(_) => MarketKey::all(),
    }
}
