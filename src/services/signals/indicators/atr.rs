//! Average True Range (ATR) indicator.

use super::Indicator;
use crate::types::Candle;

/// ATR (Average True Range) indicator.
///
/// Wilder-smoothed average of true ranges:
/// TR = max(High-Low, |High-PrevClose|, |Low-PrevClose|)
///
/// The first candle has no previous close, so the first ATR lands at index `period`.
pub struct Atr {
    period: usize,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Atr {
    fn id(&self) -> &str {
        "atr"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        atr_series(candles, self.period)
    }
}

/// Calculate True Range.
pub fn true_range(current: &Candle, previous: &Candle) -> f64 {
    let hl = current.high - current.low;
    let hc = (current.high - previous.close).abs();
    let lc = (current.low - previous.close).abs();
    hl.max(hc).max(lc)
}

pub fn atr_series(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; candles.len()];
    if period == 0 || candles.len() < period + 1 {
        return out;
    }

    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|pair| true_range(&pair[1], &pair[0]))
        .collect();

    let mut atr = true_ranges.iter().take(period).sum::<f64>() / period as f64;
    out[period] = Some(atr);

    for (i, tr) in true_ranges.iter().enumerate().skip(period) {
        atr = (atr * (period - 1) as f64 + tr) / period as f64;
        out[i + 1] = Some(atr);
    }

    out
}
