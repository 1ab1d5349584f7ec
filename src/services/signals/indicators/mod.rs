//! Technical indicator implementations.
//!
//! Every indicator produces one entry per candle. Entries before the
//! indicator's window fills are `None`.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::{atr_series, true_range, Atr};
pub use ema::{ema_series, ema_series_opt, Ema};
pub use macd::{crossover, macd_series, Macd, MacdSeries};
pub use rsi::{rsi_series, Rsi};
pub use sma::{sma_series, volume_ratio_series, VolumeRatio};

use crate::config::IndicatorConfig;
use crate::types::{Candle, IndicatorSnapshot};
use tracing::debug;

/// Trait for per-index indicator series.
pub trait Indicator: Send + Sync {
    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Minimum number of candles before the first value is present.
    fn min_periods(&self) -> usize;

    /// One entry per candle, `None` during warm-up.
    fn calculate(&self, candles: &[Candle]) -> Vec<Option<f64>>;
}

/// Compute the snapshot sequence for already-validated candles.
pub fn compute_snapshots(candles: &[Candle], config: &IndicatorConfig) -> Vec<IndicatorSnapshot> {
    let ema20 = Ema::new(config.ema_fast);
    let ema50 = Ema::new(config.ema_mid);
    let ema200 = Ema::new(config.ema_slow);
    let rsi = Rsi::new(config.rsi_period);
    let macd = Macd::new(config.macd_fast, config.macd_slow, config.macd_signal);
    let atr = Atr::new(config.atr_period);
    let volume = VolumeRatio::new(config.volume_period);

    let all: [&dyn Indicator; 7] = [&ema20, &ema50, &ema200, &rsi, &macd, &atr, &volume];
    let warm: Vec<&str> = all
        .iter()
        .filter(|ind| candles.len() < ind.min_periods())
        .map(|ind| ind.id())
        .collect();
    if !warm.is_empty() {
        debug!(
            "{} candles: still warming up {:?}, those fields stay absent",
            candles.len(),
            warm
        );
    }

    let ema20 = ema20.calculate(candles);
    let ema50 = ema50.calculate(candles);
    let ema200 = ema200.calculate(candles);
    let rsi = rsi.calculate(candles);
    let lines = macd.calculate_lines(candles);
    let atr = atr.calculate(candles);
    let volume_ratio = volume.calculate(candles);

    (0..candles.len())
        .map(|i| IndicatorSnapshot {
            ema20: ema20[i],
            ema50: ema50[i],
            ema200: ema200[i],
            rsi: rsi[i],
            macd_line: lines.line[i],
            macd_signal: lines.signal[i],
            macd_hist: lines.histogram[i],
            macd_crossover: if i == 0 {
                None
            } else {
                crossover(lines.histogram[i - 1], lines.histogram[i])
            },
            atr: atr[i],
            volume_ratio: volume_ratio[i],
        })
        .collect()
}
