use flipside::{Analysis, BinanceKlines, Config, Engine, SignalService};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flipside=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let engine = Engine::new(config.engine.clone())?;

    let warmup = config.engine.indicators.full_warmup();
    if config.candle_limit < warmup {
        warn!(
            "CANDLE_LIMIT {} is below the {}-candle warm-up, EMA200 rules stay inactive",
            config.candle_limit, warmup
        );
    }

    let source = BinanceKlines::new(
        config.binance_api_url.clone(),
        config.binance_api_key.clone(),
    );
    let service = SignalService::new(engine, source, config.timeframe.clone(), config.candle_limit);

    info!(
        "Starting Flipside for {} on {} every {}m",
        config.symbols.join(", "),
        config.timeframe,
        config.interval_minutes
    );

    if config.run_once {
        run_pass(&service, &config.symbols).await;
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_minutes.max(1) * 60));
    loop {
        tokio::select! {
            _ = ticker.tick() => run_pass(&service, &config.symbols).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn run_pass(service: &Arc<SignalService<BinanceKlines>>, symbols: &[String]) {
    let results = service.analyze_ranked(symbols).await;
    let mut failed = 0;

    for (symbol, result) in results {
        match result {
            Ok(analysis) => report(&analysis),
            Err(e) => {
                failed += 1;
                error!("{}: {}", symbol, e);
            }
        }
    }

    if failed > 0 {
        warn!("{} of {} symbols failed this pass", failed, symbols.len());
    }
}

fn report(analysis: &Analysis) {
    let signal = &analysis.signal;
    let candle_time = signal
        .datetime()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| signal.timestamp.to_string());
    info!(
        "{} {} @ {} | {} ({}%) | net {} | {}",
        analysis.symbol,
        analysis.timeframe,
        candle_time,
        signal.category,
        signal.confidence,
        signal.net_score,
        analysis.trend.label()
    );

    if let Some(support) = analysis.support {
        info!(
            "  support {:.4} ({:.2} ATR)",
            support.level, support.distance_atr
        );
    }
    if let Some(resistance) = analysis.resistance {
        info!(
            "  resistance {:.4} ({:.2} ATR)",
            resistance.level, resistance.distance_atr
        );
    }
    for flip in &analysis.flips {
        info!(
            "  flip at {:.4}: {} -> {}",
            flip.level_price,
            flip.from_role.label(),
            flip.to_role.label()
        );
    }
    for reason in &signal.reasons {
        info!("  + {}", reason);
    }
    for warning in &signal.warnings {
        warn!("  ! {}", warning);
    }
}
