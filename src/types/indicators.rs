use serde::{Deserialize, Serialize};

/// Direction of a MACD histogram zero cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdCrossover {
    /// Histogram went from <= 0 to > 0.
    Bullish,
    /// Histogram went from >= 0 to < 0.
    Bearish,
}

/// Indicator values at one candle index.
///
/// A field is `None` until its window has filled. `None` means "no evidence"
/// and is never interchangeable with a computed zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSnapshot {
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    /// Zero cross of the histogram between the previous index and this one.
    pub macd_crossover: Option<MacdCrossover>,
    pub atr: Option<f64>,
    pub volume_ratio: Option<f64>,
}

impl IndicatorSnapshot {
    /// True when every field is still warming up.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
