//! S/R flip signal engine.
//!
//! Data flows one way: indicators, then levels, then flips, then scoring.
//! The engine owns only its configuration; level history is passed in and
//! handed back through [`LevelState`].

pub mod context;
pub mod flips;
pub mod indicators;
pub mod levels;
pub mod scoring;

pub use context::{classify_trend, level_distance, volume_status};
pub use flips::track_flips;
pub use indicators::{atr_series, ema_series, macd_series, rsi_series, volume_ratio_series};
pub use levels::{
    assign_roles, classify_role, cluster_pivots, detect_levels, find_pivots, nearest_levels,
};
pub use scoring::{classify, score, ScoreInput};

use crate::config::EngineConfig;
use crate::error::{EngineResult, ValidationError};
use crate::types::{
    validate_candles, Analysis, Candle, IndicatorSnapshot, LevelDetection, LevelState, Signal,
};
use tracing::{debug, info};

/// Stateless signal engine over a validated configuration.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine. Rejects invalid parameters up front.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One snapshot per candle.
    pub fn compute_indicators(&self, candles: &[Candle]) -> EngineResult<Vec<IndicatorSnapshot>> {
        validate_candles(candles)?;
        Ok(indicators::compute_snapshots(candles, &self.config.indicators))
    }

    /// Levels at the last candle plus flips confirmed since `previous`.
    pub fn detect_levels(
        &self,
        candles: &[Candle],
        previous: &LevelState,
    ) -> EngineResult<LevelDetection> {
        validate_candles(candles)?;
        Ok(levels::detect_levels(candles, previous, &self.config.levels))
    }

    pub fn score(&self, input: &ScoreInput) -> Signal {
        scoring::score(input, &self.config.scoring)
    }

    /// Full pass at the last candle: indicators, levels, flips, score, context.
    ///
    /// Returns the analysis and the state to pass into the next call.
    pub fn analyze(
        &self,
        symbol: &str,
        timeframe: &str,
        candles: &[Candle],
        previous: &LevelState,
    ) -> EngineResult<(Analysis, LevelState)> {
        validate_candles(candles)?;
        let last = candles.last().ok_or(ValidationError::EmptySequence)?;
        let price = last.close;

        let snapshots = indicators::compute_snapshots(candles, &self.config.indicators);
        let snapshot = snapshots.last().copied().unwrap_or_default();

        let detection = levels::detect_levels(candles, previous, &self.config.levels);
        let (supports, resistances) =
            nearest_levels(&detection.levels, price, self.config.levels.nearest_k);

        let mut nearest = supports.clone();
        nearest.extend(resistances.iter().cloned());

        let signal = self.score(&ScoreInput {
            symbol,
            timestamp: last.timestamp,
            snapshot: &snapshot,
            price,
            levels: &nearest,
            flips: &detection.flips,
        });

        let context = &self.config.context;
        let analysis = Analysis {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            price,
            trend: classify_trend(price, &snapshot),
            volume_status: volume_status(snapshot.volume_ratio, context),
            support: supports
                .first()
                .and_then(|l| level_distance(l, price, snapshot.atr, context)),
            resistance: resistances
                .first()
                .and_then(|l| level_distance(l, price, snapshot.atr, context)),
            levels: nearest,
            flips: detection.flips,
            snapshot,
            signal,
        };

        debug!(
            "{} {}: {} levels, {} pending flips",
            symbol,
            timeframe,
            detection.levels.len(),
            detection.state.pending.len()
        );
        info!(
            "{} {} @ {:.4}: {} (bull {}, bear {}, confidence {}%)",
            symbol,
            timeframe,
            price,
            analysis.signal.category,
            analysis.signal.bull_score,
            analysis.signal.bear_score,
            analysis.signal.confidence
        );

        Ok((analysis, detection.state))
    }
}
