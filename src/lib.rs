//! Flipside - support/resistance flip signal engine

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::{Config, EngineConfig};
pub use error::{AppError, EngineError, ValidationError};
pub use services::{rank_results, Engine, ScoreInput, SignalService, WorkerHandle};
pub use sources::{BinanceKlines, CandleSource};
pub use types::*;
