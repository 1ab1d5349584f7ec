pub mod signals;
pub mod worker;

pub use signals::{Engine, ScoreInput};
pub use worker::{rank_results, SignalService, WorkerHandle, WorkerRequest};
