//! Per-symbol analysis workers.
//!
//! Each symbol gets one task that owns its [`LevelState`]. Callers talk to it
//! through a [`WorkerHandle`]; requests are processed one at a time, so state
//! for a symbol is never shared or raced.

use crate::error::{AppError, Result};
use crate::services::signals::Engine;
use crate::sources::CandleSource;
use crate::types::{Analysis, LevelState};
use dashmap::DashMap;
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Queued requests per worker before senders wait.
const WORKER_QUEUE: usize = 32;

/// Message accepted by a symbol worker.
#[derive(Debug)]
pub enum WorkerRequest {
    /// Fetch fresh candles, analyze, and advance the level state.
    Analyze {
        respond_to: oneshot::Sender<Result<Analysis>>,
    },
    /// Current level state, without fetching.
    State {
        respond_to: oneshot::Sender<LevelState>,
    },
}

struct SymbolWorker<S> {
    symbol: String,
    timeframe: String,
    candle_limit: usize,
    engine: Engine,
    source: Arc<S>,
    state: LevelState,
    rx: mpsc::Receiver<WorkerRequest>,
}

impl<S: CandleSource> SymbolWorker<S> {
    async fn run(mut self) {
        debug!("Worker for {} started", self.symbol);

        while let Some(request) = self.rx.recv().await {
            match request {
                WorkerRequest::Analyze { respond_to } => {
                    let result = self.analyze().await;
                    if let Err(ref e) = result {
                        warn!("Analysis failed for {}: {}", self.symbol, e);
                    }
                    let _ = respond_to.send(result);
                }
                WorkerRequest::State { respond_to } => {
                    let _ = respond_to.send(self.state.clone());
                }
            }
        }

        debug!("Worker for {} stopped", self.symbol);
    }

    async fn analyze(&mut self) -> Result<Analysis> {
        let candles = self
            .source
            .fetch_candles(&self.symbol, &self.timeframe, self.candle_limit)
            .await?;

        let (analysis, state) =
            self.engine
                .analyze(&self.symbol, &self.timeframe, &candles, &self.state)?;
        self.state = state;
        Ok(analysis)
    }
}

/// Sending side of a symbol worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    symbol: String,
    tx: mpsc::Sender<WorkerRequest>,
}

impl WorkerHandle {
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Whether the worker task has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn analyze(&self) -> Result<Analysis> {
        let (respond_to, rx) = oneshot::channel();
        self.send(WorkerRequest::Analyze { respond_to }).await?;
        rx.await.map_err(|_| self.closed())?
    }

    pub async fn state(&self) -> Result<LevelState> {
        let (respond_to, rx) = oneshot::channel();
        self.send(WorkerRequest::State { respond_to }).await?;
        rx.await.map_err(|_| self.closed())
    }

    async fn send(&self, request: WorkerRequest) -> Result<()> {
        self.tx.send(request).await.map_err(|_| self.closed())
    }

    fn closed(&self) -> AppError {
        AppError::WorkerClosed(self.symbol.clone())
    }
}

/// Registry of symbol workers sharing one engine and one candle source.
pub struct SignalService<S> {
    engine: Engine,
    source: Arc<S>,
    timeframe: String,
    candle_limit: usize,
    workers: DashMap<String, WorkerHandle>,
}

impl<S: CandleSource> SignalService<S> {
    pub fn new(
        engine: Engine,
        source: S,
        timeframe: impl Into<String>,
        candle_limit: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            source: Arc::new(source),
            timeframe: timeframe.into(),
            candle_limit,
            workers: DashMap::new(),
        })
    }

    /// Handle for `symbol`, spawning its worker on first use.
    ///
    /// Must be called from within a tokio runtime.
    /// A worker that has stopped is replaced with a fresh one.
    pub fn handle(&self, symbol: &str) -> WorkerHandle {
        let symbol = symbol.trim().to_uppercase();
        let mut entry = self
            .workers
            .entry(symbol.clone())
            .or_insert_with(|| self.spawn_worker(symbol.clone()));
        if entry.is_closed() {
            warn!("Worker for {} stopped unexpectedly, restarting", symbol);
            *entry = self.spawn_worker(symbol);
        }
        entry.clone()
    }

    fn spawn_worker(&self, symbol: String) -> WorkerHandle {
        let (tx, rx) = mpsc::channel(WORKER_QUEUE);
        let worker = SymbolWorker {
            symbol: symbol.clone(),
            timeframe: self.timeframe.clone(),
            candle_limit: self.candle_limit,
            engine: self.engine.clone(),
            source: Arc::clone(&self.source),
            state: LevelState::default(),
            rx,
        };
        tokio::spawn(worker.run());
        info!(
            "Spawned {} worker for {} ({})",
            self.source.name(),
            symbol,
            self.timeframe
        );
        WorkerHandle { symbol, tx }
    }

    pub async fn analyze(&self, symbol: &str) -> Result<Analysis> {
        self.handle(symbol).analyze().await
    }

    pub async fn state(&self, symbol: &str) -> Result<LevelState> {
        self.handle(symbol).state().await
    }

    /// Analyze every symbol concurrently. Results keep the input order.
    pub async fn analyze_all(self: &Arc<Self>, symbols: &[String]) -> Vec<(String, Result<Analysis>)> {
        let mut tasks = JoinSet::new();
        for (i, symbol) in symbols.iter().enumerate() {
            let service = Arc::clone(self);
            let symbol = symbol.clone();
            tasks.spawn(async move {
                let result = service.analyze(&symbol).await;
                (i, symbol, result)
            });
        }

        let mut results = Vec::with_capacity(symbols.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(e) => error!("Analysis task panicked: {}", e),
            }
        }
        results.sort_by_key(|(i, _, _)| *i);
        results.into_iter().map(|(_, s, r)| (s, r)).collect()
    }

    /// Analyze every symbol concurrently, strongest buy first.
    ///
    /// See [`rank_results`] for the ordering.
    pub async fn analyze_ranked(
        self: &Arc<Self>,
        symbols: &[String],
    ) -> Vec<(String, Result<Analysis>)> {
        let mut results = self.analyze_all(symbols).await;
        rank_results(&mut results);
        results
    }

    /// Symbols with a running worker.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.workers.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    /// Stop the worker for `symbol`. Its level state is discarded.
    pub fn remove(&self, symbol: &str) -> bool {
        let removed = self.workers.remove(&symbol.trim().to_uppercase()).is_some();
        if removed {
            debug!("Removed worker for {}", symbol);
        }
        removed
    }
}

/// Slot after STRONG_SELL where failed analyses sort.
const ERROR_RANK: u8 = 7;

/// Order results from STRONG_BUY through STRONG_SELL, then failures.
///
/// Within a category, higher confidence comes first. Ties keep their order.
pub fn rank_results(results: &mut [(String, Result<Analysis>)]) {
    results.sort_by_key(|(_, result)| match result {
        Ok(analysis) => (
            analysis.signal.category.rank(),
            Reverse(analysis.signal.confidence),
        ),
        Err(_) => (ERROR_RANK, Reverse(0)),
    });
}
