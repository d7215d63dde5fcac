//! Market, pricing base and series identity

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    Us,
    India,
    Crypto,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Us => "us",
            Market::India => "in",
            Market::Crypto => "crypto",
        }
    }

    /// Equity markets carry fundamentals; crypto does not
    pub fn is_equity(&self) -> bool {
        !matches!(self, Market::Crypto)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Market::Us),
            "in" | "india" => Ok(Market::India),
            "crypto" => Ok(Market::Crypto),
            other => Err(format!("unknown market: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseCurrency {
    Usd,
    Inr,
    Eth,
    Btc,
}

impl BaseCurrency {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseCurrency::Usd => "usd",
            BaseCurrency::Inr => "inr",
            BaseCurrency::Eth => "eth",
            BaseCurrency::Btc => "btc",
        }
    }

    /// USD-quoted symbol whose close prices this base is derived from
    pub fn token_symbol(&self) -> Option<&'static str> {
        match self {
            BaseCurrency::Eth => Some("X:ETHUSD"),
            BaseCurrency::Btc => Some("X:BTCUSD"),
            BaseCurrency::Usd | BaseCurrency::Inr => None,
        }
    }
}

impl fmt::Display for BaseCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BaseCurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "usd" => Ok(BaseCurrency::Usd),
            "inr" => Ok(BaseCurrency::Inr),
            "eth" => Ok(BaseCurrency::Eth),
            "btc" => Ok(BaseCurrency::Btc),
            other => Err(format!("unknown base currency: {}", other)),
        }
    }
}

/// A valid (market, base) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketKey {
    pub market: Market,
    pub base: BaseCurrency,
}

impl MarketKey {
    pub fn new(market: Market, base: BaseCurrency) -> Result<Self, String> {
        let valid = matches!(
            (market, base),
            (Market::Us, BaseCurrency::Usd)
                | (Market::India, BaseCurrency::Inr)
                | (Market::Crypto, BaseCurrency::Usd)
                | (Market::Crypto, BaseCurrency::Eth)
                | (Market::Crypto, BaseCurrency::Btc)
        );
        if valid {
            Ok(Self { market, base })
        } else {
            Err(format!("{} is not priced in {}", market, base))
        }
    }

    pub fn us() -> Self {
        Self {
            market: Market::Us,
            base: BaseCurrency::Usd,
        }
    }

    pub fn india() -> Self {
        Self {
            market: Market::India,
            base: BaseCurrency::Inr,
        }
    }

    pub fn crypto() -> Vec<Self> {
        [BaseCurrency::Usd, BaseCurrency::Eth, BaseCurrency::Btc]
            .into_iter()
            .map(|base| Self {
                market: Market::Crypto,
                base,
            })
            .collect()
    }

    pub fn all() -> Vec<Self> {
        let mut keys = vec![Self::us(), Self::india()];
        keys.extend(Self::crypto());
        keys
    }

    /// True for ETH/BTC crypto bases that can be derived from USD series
    pub fn is_derived_base(&self) -> bool {
        self.market == Market::Crypto && self.base.token_symbol().is_some()
    }

    pub fn series(&self, symbol: impl Into<String>) -> SeriesKey {
        SeriesKey {
            market: self.market,
            base: self.base,
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.market, self.base)
    }
}

impl FromStr for MarketKey {
    type Err = String;

    /// Accepts `us`, `in`, `crypto:eth` style keys
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((market, base)) => MarketKey::new(market.parse()?, base.parse()?),
            None => match s.parse::<Market>()? {
                Market::Us => Ok(Self::us()),
                Market::India => Ok(Self::india()),
                Market::Crypto => Err("crypto needs a base, e.g. crypto:usd".to_string()),
            },
        }
    }
}

/// Identity of one price series
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub market: Market,
    pub base: BaseCurrency,
    pub symbol: String,
}

impl SeriesKey {
    pub fn market_key(&self) -> MarketKey {
        MarketKey {
            market: self.market,
            base: self.base,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.market, self.base, self.symbol)
    }
}

/// A symbol in the universe with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub name: String,
}

impl SymbolInfo {
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            name: symbol.clone(),
            symbol,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
