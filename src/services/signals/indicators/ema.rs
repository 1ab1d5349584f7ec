//! Exponential Moving Average (EMA) indicator.

use super::Indicator;
use crate::types::{closes, Candle};

/// EMA (Exponential Moving Average) of closes.
///
/// Seeded with the simple mean of the first `period` values, then
/// `ema = (value - ema) * 2/(period+1) + ema`.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Ema {
    fn id(&self) -> &str {
        "ema"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        ema_series(&closes(candles), self.period)
    }
}

/// EMA for every index of `values`; `None` before index `period - 1`.
pub fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // First EMA is SMA
    let mut ema = values.iter().take(period).sum::<f64>() / period as f64;
    out[period - 1] = Some(ema);

    for (i, value) in values.iter().enumerate().skip(period) {
        ema = (value - ema) * multiplier + ema;
        out[i] = Some(ema);
    }

    out
}

/// EMA over a series that is absent for a warm-up prefix.
///
/// The EMA starts at the first present value and runs over the contiguous
/// present run after it.
pub fn ema_series_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let Some(start) = values.iter().position(|v| v.is_some()) else {
        return out;
    };

    let present: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();
    for (offset, value) in ema_series(&present, period).into_iter().enumerate() {
        out[start + offset] = value;
    }

    out
}
