//! Simple moving average and the volume ratio built on it.

use super::Indicator;
use crate::types::{volumes, Candle};

/// Trailing simple moving average for every index; `None` before `period - 1`.
pub fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum: f64 = values.iter().take(period).sum();
    out[period - 1] = Some(sum / period as f64);

    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }

    out
}

/// Current volume divided by its trailing average (current candle included).
///
/// A zero average leaves the ratio absent.
pub struct VolumeRatio {
    period: usize,
}

impl VolumeRatio {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for VolumeRatio {
    fn id(&self) -> &str {
        "volume_ratio"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        volume_ratio_series(&volumes(candles), self.period)
    }
}

pub fn volume_ratio_series(volumes: &[f64], period: usize) -> Vec<Option<f64>> {
    sma_series(volumes, period)
        .into_iter()
        .zip(volumes)
        .map(|(avg, volume)| match avg {
            Some(avg) if avg > 0.0 => Some(volume / avg),
            _ => None,
        })
        .collect()
}
