use thiserror::Error;

/// Input rejected before any computation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Malformed candle at index {index}: {reason}")]
    MalformedCandle { index: usize, reason: String },

    #[error("Candle at index {index} is out of order: timestamp {current} after {previous}")]
    OutOfOrder {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("No candles to analyze")]
    EmptySequence,
}

/// Errors raised by the signal engine.
///
/// Short input is not an error: indicators with an unfilled window are absent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Runtime errors for the scheduled runner and per-symbol workers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Market data error: {0}")]
    Source(String),

    #[error("Worker for {0} is no longer running")]
    WorkerClosed(String),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::MalformedCandle {
            index: 7,
            reason: "negative volume -1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed candle at index 7: negative volume -1"
        );
    }

    #[test]
    fn test_engine_error_from_validation() {
        let err: EngineError = ValidationError::OutOfOrder {
            index: 1,
            previous: 10,
            current: 5,
        }
        .into();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_app_error_wraps_engine_error() {
        let err: AppError = EngineError::Configuration("tolerance must be > 0".into()).into();
        assert_eq!(err.to_string(), "Configuration error: tolerance must be > 0");
    }
}
