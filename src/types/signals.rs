use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::candle::millis_to_datetime;
use super::indicators::IndicatorSnapshot;
use super::levels::{FlipEvent, SrLevel};

/// Final signal category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalCategory {
    StrongBuy,
    Buy,
    WeakBuy,
    Hold,
    WeakSell,
    Sell,
    StrongSell,
}

impl SignalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalCategory::StrongBuy => "STRONG_BUY",
            SignalCategory::Buy => "BUY",
            SignalCategory::WeakBuy => "WEAK_BUY",
            SignalCategory::Hold => "HOLD",
            SignalCategory::WeakSell => "WEAK_SELL",
            SignalCategory::Sell => "SELL",
            SignalCategory::StrongSell => "STRONG_SELL",
        }
    }

    /// Position in a strongest-buy-first ranking, 0 for STRONG_BUY.
    pub fn rank(&self) -> u8 {
        match self {
            SignalCategory::StrongBuy => 0,
            SignalCategory::Buy => 1,
            SignalCategory::WeakBuy => 2,
            SignalCategory::Hold => 3,
            SignalCategory::WeakSell => 4,
            SignalCategory::Sell => 5,
            SignalCategory::StrongSell => 6,
        }
    }
}

impl fmt::Display for SignalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorical signal with its explainable score breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub symbol: String,
    /// Timestamp (ms) of the candle the signal was computed at.
    pub timestamp: i64,
    /// Clamped bullish evidence, 0-100.
    pub bull_score: u8,
    /// Clamped bearish evidence, 0-100.
    pub bear_score: u8,
    /// `bull_score - bear_score`.
    pub net_score: i16,
    pub category: SignalCategory,
    /// 0-100, capped for HOLD and reduced on mixed evidence.
    pub confidence: u8,
    /// Fired rules in evaluation order, bull rules first.
    pub reasons: Vec<String>,
    /// Cautions that never move either score.
    pub warnings: Vec<String>,
}

impl Signal {
    /// Candle open time the signal was computed at.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.timestamp)
    }
}

/// EMA-stack trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongUp,
    WeakUp,
    Ranging,
    WeakDown,
    StrongDown,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::StrongUp => "Strong Uptrend",
            Trend::WeakUp => "Weak Uptrend",
            Trend::Ranging => "Ranging",
            Trend::WeakDown => "Weak Downtrend",
            Trend::StrongDown => "Strong Downtrend",
        }
    }
}

/// Current volume relative to its 20-candle average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStatus {
    High,
    Normal,
    Low,
}

/// Distance bucket of a level measured in ATR units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proximity {
    VeryClose,
    Close,
    Far,
}

/// Nearest level with its distance from price in ATR units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDistance {
    pub level: f64,
    pub distance: f64,
    pub distance_atr: f64,
    pub proximity: Proximity,
}

/// Full result of one analysis pass for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub symbol: String,
    pub timeframe: String,
    pub price: f64,
    pub signal: Signal,
    pub snapshot: IndicatorSnapshot,
    pub trend: Trend,
    pub volume_status: VolumeStatus,
    pub support: Option<LevelDistance>,
    pub resistance: Option<LevelDistance>,
    /// Top-K nearest supports followed by top-K nearest resistances.
    pub levels: Vec<SrLevel>,
    pub flips: Vec<FlipEvent>,
}
