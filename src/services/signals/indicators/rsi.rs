//! Relative Strength Index (RSI) indicator.

use super::Indicator;
use crate::types::{closes, Candle};

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses,
/// using Wilder's smoothing. Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// An average loss of exactly zero gives 100, flat series included.
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Rsi {
    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        rsi_series(&closes(candles), self.period)
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// RSI for every index of `closes`; first defined at index `period`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for window in closes.windows(2) {
        let change = window[1] - window[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    // Calculate initial averages
    let mut avg_gain: f64 = gains.iter().take(period).sum::<f64>() / period as f64;
    let mut avg_loss: f64 = losses.iter().take(period).sum::<f64>() / period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    // gains[i] is the change into close i + 1
    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
        out[i + 1] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64 * 1.5).collect()
    }

    fn downtrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 200.0 - i as f64 * 1.5).collect()
    }

    #[test]
    fn test_rsi_min_periods() {
        assert_eq!(Rsi::new(14).min_periods(), 15);
        assert_eq!(Rsi::new(7).min_periods(), 8);
    }

    #[test]
    fn test_rsi_warmup() {
        let rsi = rsi_series(&uptrend(20), 14);
        assert!(rsi[..14].iter().all(|v| v.is_none()));
        assert!(rsi[14].is_some());
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let rsi = rsi_series(&uptrend(14), 14);
        assert!(rsi.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rsi_pure_uptrend_is_100() {
        let rsi = rsi_series(&uptrend(50), 14);
        assert_eq!(rsi[49], Some(100.0));
    }

    #[test]
    fn test_rsi_downtrend_low_value() {
        let rsi = rsi_series(&downtrend(50), 14);
        let value = rsi[49].unwrap();
        assert!(value < 50.0, "RSI in downtrend should be < 50, got {}", value);
    }

    #[test]
    fn test_rsi_flat_series_uses_zero_loss_rule() {
        let rsi = rsi_series(&vec![50.0; 40], 14);
        for value in rsi.iter().skip(14) {
            assert_eq!(*value, Some(100.0));
        }
    }

    #[test]
    fn test_rsi_alternating_is_balanced() {
        let closes: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let value = rsi_series(&closes, 14)[59].unwrap();
        assert!((value - 50.0).abs() < 5.0, "got {}", value);
    }

    #[test]
    fn test_rsi_value_range() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + ((i * 7) % 11) as f64).collect();
        for value in rsi_series(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value));
        }
    }
}
