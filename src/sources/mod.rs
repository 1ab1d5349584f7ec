pub mod binance;

pub use binance::BinanceKlines;

use crate::error::Result;
use crate::types::Candle;
use std::future::Future;

/// Provider of closed OHLCV candles, oldest first.
pub trait CandleSource: Send + Sync + 'static {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Fetch the most recent `limit` candles for `symbol` at `timeframe`.
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candle>>> + Send;
}
