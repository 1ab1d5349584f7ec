#![allow(dead_code)]

use flipside::Candle;

pub const HOUR_MS: i64 = 3_600_000;

/// Quiet candle around 100 with a fixed range.
pub fn flat(index: usize) -> Candle {
    Candle::new(index as i64 * HOUR_MS, 100.0, 101.0, 99.0, 100.0, 1_000.0)
}

/// Flat market with a single pivot high at 110 on candle 5.
///
/// Candles listed in `above` close at 111, above the 110 level.
pub fn spike_series(count: usize, above: &[usize]) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let mut candle = flat(i);
            if i == 5 {
                candle.high = 110.0;
            }
            if above.contains(&i) {
                candle.high = 111.5;
                candle.close = 111.0;
            }
            candle
        })
        .collect()
}

/// Gently rising sine wave, valid OHLC throughout.
pub fn wave(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let base = 100.0 + i as f64 * 0.2 + (i as f64 * 0.4).sin() * 3.0;
            Candle::new(
                i as i64 * HOUR_MS,
                base,
                base + 1.5,
                base - 1.5,
                base + 0.4,
                1_000.0 + (i % 5) as f64 * 100.0,
            )
        })
        .collect()
}
