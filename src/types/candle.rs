use crate::error::ValidationError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Unix milliseconds as a UTC datetime, if representable.
pub fn millis_to_datetime(timestamp: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(timestamp).single()
}

/// OHLCV candle. Timestamp is the open time in Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Open time as a UTC datetime, if the timestamp is representable.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.timestamp)
    }

    /// Check the OHLC invariants for the candle at `index`.
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(ValidationError::MalformedCandle {
                index,
                reason: "non-finite value".to_string(),
            });
        }
        if self.high < self.open.max(self.close) {
            return Err(ValidationError::MalformedCandle {
                index,
                reason: format!("high {} below open/close", self.high),
            });
        }
        if self.low > self.open.min(self.close) {
            return Err(ValidationError::MalformedCandle {
                index,
                reason: format!("low {} above open/close", self.low),
            });
        }
        if self.volume < 0.0 {
            return Err(ValidationError::MalformedCandle {
                index,
                reason: format!("negative volume {}", self.volume),
            });
        }
        Ok(())
    }
}

/// Validate every candle and the strictly increasing timestamp order.
///
/// The first violation rejects the whole sequence.
pub fn validate_candles(candles: &[Candle]) -> Result<(), ValidationError> {
    for (index, candle) in candles.iter().enumerate() {
        candle.validate(index)?;
        if index > 0 {
            let previous = candles[index - 1].timestamp;
            if candle.timestamp <= previous {
                return Err(ValidationError::OutOfOrder {
                    index,
                    previous,
                    current: candle.timestamp,
                });
            }
        }
    }
    Ok(())
}

/// Extract close prices.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Extract volumes.
pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.volume).collect()
}
