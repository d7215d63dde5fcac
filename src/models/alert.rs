use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert type as stored in the ledger's `type` field. Types written by other
/// versions are kept verbatim in `Other` so merging stays idempotent by type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlertKind {
    Oversold,
    ObvPositive,
    ObvNegative,
    HeikinAshi3dBullish,
    HeikinAshi3dBearish,
    HeikinAshi2wBullish,
    HeikinAshi2wBearish,
    Other(String),
}

impl AlertKind {
    pub fn as_str(&self) -> &str {
        match self {
            AlertKind::Oversold => "oversold",
            AlertKind::ObvPositive => "obv_positive",
            AlertKind::ObvNegative => "obv_negative",
            AlertKind::HeikinAshi3dBullish => "heikin_ashi_3d_bullish",
            AlertKind::HeikinAshi3dBearish => "heikin_ashi_3d_bearish",
            AlertKind::HeikinAshi2wBullish => "heikin_ashi_2w_bullish",
            AlertKind::HeikinAshi2wBearish => "heikin_ashi_2w_bearish",
            AlertKind::Other(raw) => raw,
        }
    }
}

impl From<String> for AlertKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "oversold" => AlertKind::Oversold,
            "obv_positive" => AlertKind::ObvPositive,
            "obv_negative" => AlertKind::ObvNegative,
            "heikin_ashi_3d_bullish" => AlertKind::HeikinAshi3dBullish,
            "heikin_ashi_3d_bearish" => AlertKind::HeikinAshi3dBearish,
            "heikin_ashi_2w_bullish" => AlertKind::HeikinAshi2wBullish,
            "heikin_ashi_2w_bearish" => AlertKind::HeikinAshi2wBearish,
            _ => AlertKind::Other(raw),
        }
    }
}

impl From<AlertKind> for String {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub value: String,
    pub description: String,
}

impl Alert {
    pub fn new(kind: AlertKind, value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            description: description.into(),
        }
    }
}

/// Alerts recorded for one symbol on one date, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertLedgerEntry {
    pub symbol: String,
    pub date: NaiveDate,
    pub name: String,
    pub alerts: Vec<Alert>,
}

impl AlertLedgerEntry {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            name: name.into(),
            alerts: Vec::new(),
        }
    }

    pub fn has(&self, kind: &AlertKind) -> bool {
        self.alerts.iter().any(|a| &a.kind == kind)
    }
}
