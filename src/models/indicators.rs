use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One daily OHLCV row as it arrives at the ingestion boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl PricePoint {
    pub fn new(
        timestamp: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(volume),
        }
    }

    /// Build a row from vendor text fields, coercing anything unparseable to null
    pub fn from_text(
        timestamp: NaiveDate,
        open: &str,
        high: &str,
        low: &str,
        close: &str,
        volume: &str,
    ) -> Self {
        Self {
            timestamp,
            open: parse_numeric(open),
            high: parse_numeric(high),
            low: parse_numeric(low),
            close: parse_numeric(close),
            volume: parse_numeric(volume),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.as_bar().is_some()
    }

    pub fn as_bar(&self) -> Option<Bar> {
        let bar = Bar {
            timestamp: self.timestamp,
            open: finite(self.open)?,
            high: finite(self.high)?,
            low: finite(self.low)?,
            close: finite(self.close)?,
            volume: finite(self.volume)?,
        };
        Some(bar)
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Parse a vendor numeric field. Thousands separators are stripped; blanks,
/// dashes and non-finite values become `None`.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A complete OHLCV row, the only shape the weekly engines consume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

impl From<Bar> for PricePoint {
    fn from(bar: Bar) -> Self {
        PricePoint::new(bar.timestamp, bar.open, bar.high, bar.low, bar.close, bar.volume)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleColor {
    Green,
    Red,
}

/// Transition between the colors of two consecutive Heikin-Ashi candles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorChange {
    RedToGreen,
    GreenToRed,
}

impl ColorChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorChange::RedToGreen => "red_to_green",
            ColorChange::GreenToRed => "green_to_red",
        }
    }
}

impl fmt::Display for ColorChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeikinAshiCandle {
    pub timestamp: NaiveDate,
    pub ha_open: Option<f64>,
    pub ha_high: Option<f64>,
    pub ha_low: Option<f64>,
    pub ha_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ha_color: Option<CandleColor>,
}

/// Williams %R alert states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MomentumState {
    Inactive,
    Fresh,
    Continuation,
}

impl MomentumState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MomentumState::Inactive => "INACTIVE",
            MomentumState::Fresh => "FRESH",
            MomentumState::Continuation => "CONTINUATION",
        }
    }
}

impl fmt::Display for MomentumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MomentumState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INACTIVE" => Ok(MomentumState::Inactive),
            "FRESH" => Ok(MomentumState::Fresh),
            "CONTINUATION" => Ok(MomentumState::Continuation),
            other => Err(format!("unknown momentum state: {}", other)),
        }
    }
}

/// Force Index alert states. `Fresh`/`Continuation` belong to the continuation
/// machine, `FreshUp`/`FreshDown` to the directional one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForceIndexState {
    Inactive,
    Fresh,
    Continuation,
    FreshUp,
    FreshDown,
}

impl ForceIndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceIndexState::Inactive => "INACTIVE",
            ForceIndexState::Fresh => "FRESH",
            ForceIndexState::Continuation => "CONTINUATION",
            ForceIndexState::FreshUp => "FRESH_UP",
            ForceIndexState::FreshDown => "FRESH_DOWN",
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(
            self,
            ForceIndexState::Fresh | ForceIndexState::FreshUp | ForceIndexState::FreshDown
        )
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, ForceIndexState::Inactive)
    }
}

impl fmt::Display for ForceIndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForceIndexState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INACTIVE" => Ok(ForceIndexState::Inactive),
            "FRESH" => Ok(ForceIndexState::Fresh),
            "CONTINUATION" => Ok(ForceIndexState::Continuation),
            "FRESH_UP" => Ok(ForceIndexState::FreshUp),
            "FRESH_DOWN" => Ok(ForceIndexState::FreshDown),
            other => Err(format!("unknown force index state: {}", other)),
        }
    }
}

/// Zero-line crossing of the anchored OBV, derived from the previous value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObvCross {
    PositiveCross,
    NegativeCross,
    None,
}

impl ObvCross {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObvCross::PositiveCross => "POSITIVE_CROSS",
            ObvCross::NegativeCross => "NEGATIVE_CROSS",
            ObvCross::None => "NONE",
        }
    }
}

impl fmt::Display for ObvCross {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObvCross {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POSITIVE_CROSS" => Ok(ObvCross::PositiveCross),
            "NEGATIVE_CROSS" => Ok(ObvCross::NegativeCross),
            "NONE" => Ok(ObvCross::None),
            other => Err(format!("unknown obv cross: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WilliamsRReading {
    pub timestamp: NaiveDate,
    pub williams_r: f64,
    pub williams_r_ema: f64,
    pub state: MomentumState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceIndexReading {
    pub timestamp: NaiveDate,
    pub fast: f64,
    pub slow: f64,
    /// Values the crossover was measured against
    pub previous_fast: f64,
    pub previous_slow: f64,
    pub state: ForceIndexState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchoredObvReading {
    pub timestamp: NaiveDate,
    pub anchored_obv: f64,
    pub anchor_date: NaiveDate,
    pub confidence: f64,
    pub cross: ObvCross,
}

/// Previous Force Index values for a symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorForceIndex {
    pub fast: f64,
    pub slow: f64,
    pub state: ForceIndexState,
}

/// The only inputs that carry over between runs. Loaded once per symbol
/// from the rows strictly before the evaluation date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub williams_r: Option<MomentumState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_index: Option<PriorForceIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchored_obv: Option<f64>,
}

impl PriorState {
    pub fn with_williams_r(mut self, state: MomentumState) -> Self {
        self.williams_r = Some(state);
        self
    }

    pub fn with_force_index(mut self, fast: f64, slow: f64, state: ForceIndexState) -> Self {
        self.force_index = Some(PriorForceIndex { fast, slow, state });
        self
    }

    pub fn with_anchored_obv(mut self, obv: f64) -> Self {
        self.anchored_obv = Some(obv);
        self
    }
}

/// The weekly engines that persist a reading per symbol and date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    WilliamsR,
    ForceIndex,
    AnchoredObv,
}

impl IndicatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::WilliamsR => "williams_r",
            IndicatorKind::ForceIndex => "force_index",
            IndicatorKind::AnchoredObv => "anchored_obv",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engines wrote for one symbol and date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolReadings {
    pub symbol: String,
    pub timestamp: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub williams_r: Option<WilliamsRReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_index: Option<ForceIndexReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchored_obv: Option<AnchoredObvReading>,
}

impl SymbolReadings {
    pub fn empty(symbol: impl Into<String>, timestamp: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            williams_r: None,
            force_index: None,
            anchored_obv: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.williams_r.is_none() && self.force_index.is_none() && self.anchored_obv.is_none()
    }

    /// Drop the reading `kind` wrote, if any
    pub fn clear(&mut self, kind: IndicatorKind) {
        match kind {
            IndicatorKind::WilliamsR => self.williams_r = None,
            IndicatorKind::ForceIndex => self.force_index = None,
            IndicatorKind::AnchoredObv => self.anchored_obv = None,
        }
    }
}
