use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Daily OHLCV bar for a single instrument
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Stock bar paired with the benchmark index close for the same date
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct IndexedBar {
    pub bar: Bar,
    pub index_close: f64,
}

/// Market regime attached to every classified bar
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Regime {
    #[serde(rename = "Risk-On")]
    RiskOn,
    #[serde(rename = "Volatile")]
    Volatile,
    #[serde(rename = "Risk-Off")]
    RiskOff,
    #[serde(rename = "Low-Liquidity")]
    LowLiquidity,
}

impl Regime {
    pub const ALL: [Regime; 4] = [
        Regime::RiskOn,
        Regime::Volatile,
        Regime::RiskOff,
        Regime::LowLiquidity,
    ];
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Regime::RiskOn => "Risk-On",
            Regime::Volatile => "Volatile",
            Regime::RiskOff => "Risk-Off",
            Regime::LowLiquidity => "Low-Liquidity",
        };
        f.write_str(label)
    }
}

/// Discrete trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SignalDirection {
    Sell,
    Hold,
    Buy,
}

impl SignalDirection {
    /// Numeric encoding used in exported series (-1, 0, +1)
    pub fn value(self) -> i8 {
        match self {
            SignalDirection::Sell => -1,
            SignalDirection::Hold => 0,
            SignalDirection::Buy => 1,
        }
    }
}

/// Per-bar signal annotation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub direction: SignalDirection,
    /// Fraction of the position suggested for round-trip trading, in [0, 1]
    pub position_fraction: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Next-session action issued by the directional predictor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Action {
    BuyFirst,
    SellFirst,
    /// Generic range trade, executed with the sell-first leg order
    RangeTrade,
    Wait,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::BuyFirst => "BuyFirst",
            Action::SellFirst => "SellFirst",
            Action::RangeTrade => "RangeT",
            Action::Wait => "Wait",
        };
        f.write_str(label)
    }
}

/// Forecast made after the close of `as_of`, consumed on the following session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub as_of: NaiveDate,
    pub month_trend: Trend,
    pub week_trend: Trend,
    pub day_trend: Trend,
    pub action: Action,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
}

impl Prediction {
    /// Placeholder used when there is not enough history to run the predictor
    pub fn wait(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            month_trend: Trend::Flat,
            week_trend: Trend::Flat,
            day_trend: Trend::Flat,
            action: Action::Wait,
            buy_price: None,
            sell_price: None,
        }
    }
}

/// Realized outcome of one simulated session
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TradeType {
    BuyFirstSuccess,
    BuyFirstFailedClose,
    SellFirstSuccess,
    SellFirstFailedClose,
    #[serde(rename = "None")]
    NoTrade,
}

impl TradeType {
    pub fn is_trade(self) -> bool {
        self != TradeType::NoTrade
    }

    /// Both legs filled at their predicted prices
    pub fn is_success(self) -> bool {
        matches!(
            self,
            TradeType::BuyFirstSuccess | TradeType::SellFirstSuccess
        )
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TradeType::BuyFirstSuccess => "BuyFirst_Success",
            TradeType::BuyFirstFailedClose => "BuyFirst_Failed_Close",
            TradeType::SellFirstSuccess => "SellFirst_Success",
            TradeType::SellFirstFailedClose => "SellFirst_Failed_Close",
            TradeType::NoTrade => "None",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TradeOutcome {
    pub trade_type: TradeType,
    pub cash_delta: f64,
}

impl TradeOutcome {
    pub fn none() -> Self {
        Self {
            trade_type: TradeType::NoTrade,
            cash_delta: 0.0,
        }
    }
}

/// The same instrument at daily, weekly and monthly granularity
#[derive(Debug, Clone, Default)]
pub struct MultiPeriodBars {
    pub daily: Vec<Bar>,
    pub weekly: Vec<Bar>,
    pub monthly: Vec<Bar>,
}
