use super::CandleSource;
use crate::error::{AppError, Result};
use crate::types::Candle;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

/// Binance allows at most this many klines per request.
const MAX_KLINES: usize = 1000;

/// Characters of an error body kept in logs.
const ERROR_BODY_CHARS: usize = 200;

/// Binance REST klines client.
#[derive(Clone)]
pub struct BinanceKlines {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl BinanceKlines {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .user_agent("Flipside/0.1")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn request_klines(&self, symbol: &str, interval: &str, limit: usize) -> Result<Value> {
        let url = format!("{}/klines", self.base_url);
        let limit = limit.clamp(1, MAX_KLINES).to_string();

        let mut request = self.client.get(&url).query(&[
            ("symbol", symbol),
            ("interval", interval),
            ("limit", limit.as_str()),
        ]);
        if let Some(ref key) = self.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(
                "Binance klines for {} returned {}: {}",
                symbol,
                status,
                truncate_body(&text, ERROR_BODY_CHARS)
            );
            return Err(AppError::Source(format!(
                "Binance API error {} for {}",
                status, symbol
            )));
        }

        Ok(response.json().await?)
    }
}

impl CandleSource for BinanceKlines {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_candles(&self, symbol: &str, timeframe: &str, limit: usize) -> Result<Vec<Candle>> {
        let body = self.request_klines(symbol, timeframe, limit).await?;
        let candles = parse_klines(&body)?;
        debug!("Fetched {} {} klines for {}", candles.len(), timeframe, symbol);
        Ok(candles)
    }
}

/// First `max_chars` characters of `text`, cut on a character boundary.
fn truncate_body(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Parse a Binance klines response.
///
/// Each row is `[openTime, open, high, low, close, volume, closeTime, ...]`
/// with prices encoded as strings.
pub fn parse_klines(body: &Value) -> Result<Vec<Candle>> {
    let rows = body
        .as_array()
        .ok_or_else(|| AppError::Source("klines response is not an array".to_string()))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            parse_row(row).ok_or_else(|| AppError::Source(format!("malformed kline row {}", i)))
        })
        .collect()
}

fn parse_row(row: &Value) -> Option<Candle> {
    let fields = row.as_array()?;
    if fields.len() < 6 {
        return None;
    }
    let number = |v: &Value| -> Option<f64> {
        match v {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    };

    Some(Candle {
        timestamp: fields[0].as_i64()?,
        open: number(&fields[1])?,
        high: number(&fields[2])?,
        low: number(&fields[3])?,
        close: number(&fields[4])?,
        volume: number(&fields[5])?,
    })
}
