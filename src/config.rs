use crate::error::{EngineError, EngineResult};
use std::env;

/// Indicator periods.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_mid: usize,
    pub ema_slow: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    /// Trailing window of the volume average used by `volume_ratio`.
    pub volume_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 20,
            ema_mid: 50,
            ema_slow: 200,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
            volume_period: 20,
        }
    }
}

impl IndicatorConfig {
    /// Candles needed before every field of a snapshot can be present.
    pub fn full_warmup(&self) -> usize {
        self.ema_slow
            .max(self.macd_slow + self.macd_signal - 1)
            .max(self.rsi_period + 1)
            .max(self.atr_period + 1)
            .max(self.volume_period)
    }

    pub fn validate(&self) -> EngineResult<()> {
        let periods = [
            ("ema_fast", self.ema_fast),
            ("ema_mid", self.ema_mid),
            ("ema_slow", self.ema_slow),
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr_period", self.atr_period),
            ("volume_period", self.volume_period),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(EngineError::Configuration(format!(
                "{} must be a positive period",
                name
            )));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(EngineError::Configuration(format!(
                "macd_fast ({}) must be shorter than macd_slow ({})",
                self.macd_fast, self.macd_slow
            )));
        }
        Ok(())
    }
}

/// Pivot detection, clustering and flip confirmation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelConfig {
    /// Candles on each side a pivot must dominate.
    pub pivot_window: usize,
    /// Clustering / matching tolerance as a fraction of price (0.003 = 0.3%).
    pub tolerance: f64,
    /// Nearest supports and resistances handed to the scorer.
    pub nearest_k: usize,
    /// Candles a new role must hold before a flip is reported.
    pub confirm_distance: usize,
    /// Clusters with fewer pivots are discarded.
    pub min_strength: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            pivot_window: 5,
            tolerance: 0.003,
            nearest_k: 2,
            confirm_distance: 2,
            min_strength: 1,
        }
    }
}

impl LevelConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.pivot_window == 0 {
            return Err(EngineError::Configuration(
                "pivot_window must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance > 0.0 && self.tolerance < 1.0) {
            return Err(EngineError::Configuration(format!(
                "tolerance must be in (0, 1), got {}",
                self.tolerance
            )));
        }
        if self.nearest_k < 1 {
            return Err(EngineError::Configuration(
                "nearest_k must be at least 1".to_string(),
            ));
        }
        if self.min_strength < 1 {
            return Err(EngineError::Configuration(
                "min_strength must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Points added by each scoring rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringWeights {
    pub price_above_ema: u8,
    pub bullish_stack: u8,
    pub near_support: u8,
    pub rsi_bullish_band: u8,
    pub rsi_oversold: u8,
    pub macd_bullish_cross: u8,
    pub high_volume: u8,
    pub bullish_flip: u8,
    pub price_below_ema: u8,
    pub bearish_stack: u8,
    pub near_resistance: u8,
    pub rsi_bearish_band: u8,
    pub rsi_overbought: u8,
    pub macd_bearish_cross: u8,
    pub low_volume: u8,
    pub bearish_flip: u8,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            price_above_ema: 15,
            bullish_stack: 20,
            near_support: 15,
            rsi_bullish_band: 10,
            rsi_oversold: 15,
            macd_bullish_cross: 15,
            high_volume: 10,
            bullish_flip: 25,
            price_below_ema: 15,
            bearish_stack: 20,
            near_resistance: 15,
            rsi_bearish_band: 10,
            rsi_overbought: 15,
            macd_bearish_cross: 15,
            low_volume: 5,
            bearish_flip: 25,
        }
    }
}

/// Thresholds for the scorer and the signal's confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub weights: ScoringWeights,
    /// Max distance from the nearest level, as a fraction of it (0.015 = 1.5%).
    pub proximity_pct: f64,
    pub rsi_oversold: f64,
    pub rsi_neutral: f64,
    pub rsi_overbought: f64,
    /// Whether band edges (30, 50, 70) belong to the mild RSI bands.
    pub rsi_inclusive_bounds: bool,
    pub high_volume_ratio: f64,
    pub low_volume_ratio: f64,
    /// Both scores above this mark the signal as mixed.
    pub mixed_threshold: u8,
    /// Confidence multiplier on mixed signals.
    pub mixed_penalty: f64,
    pub hold_confidence_cap: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            proximity_pct: 0.015,
            rsi_oversold: 30.0,
            rsi_neutral: 50.0,
            rsi_overbought: 70.0,
            rsi_inclusive_bounds: true,
            high_volume_ratio: 1.2,
            low_volume_ratio: 0.8,
            mixed_threshold: 20,
            mixed_penalty: 0.8,
            hold_confidence_cap: 39,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.proximity_pct <= 0.0 {
            return Err(EngineError::Configuration(format!(
                "proximity_pct must be > 0, got {}",
                self.proximity_pct
            )));
        }
        if !(self.rsi_oversold < self.rsi_neutral && self.rsi_neutral < self.rsi_overbought) {
            return Err(EngineError::Configuration(
                "RSI bands must satisfy oversold < neutral < overbought".to_string(),
            ));
        }
        if self.low_volume_ratio >= self.high_volume_ratio {
            return Err(EngineError::Configuration(
                "low_volume_ratio must be below high_volume_ratio".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mixed_penalty) {
            return Err(EngineError::Configuration(format!(
                "mixed_penalty must be in [0, 1], got {}",
                self.mixed_penalty
            )));
        }
        Ok(())
    }
}

/// Thresholds for the descriptive market context.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    pub high_volume_status: f64,
    pub low_volume_status: f64,
    pub very_close_atr: f64,
    pub close_atr: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            high_volume_status: 1.5,
            low_volume_status: 0.8,
            very_close_atr: 0.5,
            close_atr: 1.0,
        }
    }
}

impl ContextConfig {
    pub fn validate(&self) -> EngineResult<()> {
        let thresholds = [
            ("high_volume_status", self.high_volume_status),
            ("low_volume_status", self.low_volume_status),
            ("very_close_atr", self.very_close_atr),
            ("close_atr", self.close_atr),
        ];
        for (name, value) in thresholds {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::Configuration(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.low_volume_status >= self.high_volume_status {
            return Err(EngineError::Configuration(
                "low_volume_status must be below high_volume_status".to_string(),
            ));
        }
        if self.very_close_atr > self.close_atr {
            return Err(EngineError::Configuration(
                "very_close_atr must not exceed close_atr".to_string(),
            ));
        }
        Ok(())
    }
}

/// All engine parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub levels: LevelConfig,
    pub scoring: ScoringConfig,
    pub context: ContextConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.indicators.validate()?;
        self.levels.validate()?;
        self.scoring.validate()?;
        self.context.validate()?;
        Ok(())
    }

    /// Defaults with level overrides taken from the environment.
    pub fn from_env() -> Self {
        let defaults = LevelConfig::default();
        Self {
            levels: LevelConfig {
                pivot_window: env_parse("PIVOT_WINDOW").unwrap_or(defaults.pivot_window),
                tolerance: env_parse("LEVEL_TOLERANCE").unwrap_or(defaults.tolerance),
                nearest_k: env_parse("NEAREST_LEVELS").unwrap_or(defaults.nearest_k),
                confirm_distance: env_parse("FLIP_CONFIRM_CANDLES")
                    .unwrap_or(defaults.confirm_distance),
                min_strength: env_parse("MIN_LEVEL_STRENGTH").unwrap_or(defaults.min_strength),
            },
            ..Self::default()
        }
    }
}

/// Runtime configuration for the scheduled runner.
#[derive(Debug, Clone)]
pub struct Config {
    /// Trading pairs to analyze (e.g. "BTCUSDT").
    pub symbols: Vec<String>,
    /// Candle interval passed to the data source (e.g. "1h").
    pub timeframe: String,
    /// Minutes between scheduled passes.
    pub interval_minutes: u64,
    /// Candles requested per analysis.
    pub candle_limit: usize,
    /// Binance REST base URL.
    pub binance_api_url: String,
    /// Binance API key (optional, klines are public).
    pub binance_api_key: Option<String>,
    /// Run a single pass and exit.
    pub run_once: bool,
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        // Format: "BTCUSDT,ETHUSDT"
        let symbols = env::var("SYMBOLS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|sym| sym.trim().to_uppercase())
                    .filter(|sym| !sym.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);

        Self {
            symbols,
            timeframe: env::var("TIMEFRAME").unwrap_or_else(|_| "1h".to_string()),
            interval_minutes: env_parse("ANALYSIS_INTERVAL_MINUTES").unwrap_or(15),
            candle_limit: env_parse("CANDLE_LIMIT").unwrap_or(250),
            binance_api_url: env::var("BINANCE_API_URL")
                .unwrap_or_else(|_| "https://api.binance.com/api/v3".to_string()),
            binance_api_key: env::var("BINANCE_API_KEY").ok().filter(|k| !k.is_empty()),
            run_once: env::var("RUN_ONCE")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            engine: EngineConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
