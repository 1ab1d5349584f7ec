//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::{ema_series, ema_series_opt};
use super::Indicator;
use crate::types::{closes, Candle, MacdCrossover};

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

/// Per-index MACD lines.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

impl Macd {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    pub fn calculate_lines(&self, candles: &[Candle]) -> MacdSeries {
        macd_series(
            &closes(candles),
            self.fast_period,
            self.slow_period,
            self.signal_period,
        )
    }
}

impl Indicator for Macd {
    fn id(&self) -> &str {
        "macd"
    }

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period - 1
    }

    /// Histogram series.
    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>> {
        self.calculate_lines(candles).histogram
    }
}

pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal_line = ema_series_opt(&line, signal);

    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal: signal_line,
        histogram,
    }
}

/// Zero cross of the histogram from `previous` to `current`.
pub fn crossover(previous: Option<f64>, current: Option<f64>) -> Option<MacdCrossover> {
    let (previous, current) = (previous?, current?);
    if previous <= 0.0 && current > 0.0 {
        Some(MacdCrossover::Bullish)
    } else if previous >= 0.0 && current < 0.0 {
        Some(MacdCrossover::Bearish)
    } else {
        None
    }
}
