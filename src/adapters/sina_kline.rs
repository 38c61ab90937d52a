//! Sina daily kline JSON (`CN_MarketData.getKLineData`).
//!
//! Items are `{day, open, high, low, close, volume}` with every number sent
//! as a string. The endpoint does not report daily change, so it is derived
//! from the previous close unless an item carries `pct_chg`.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::adapters::http::fetch_text;
use crate::domain::candle::{normalize_series, Candle};
use crate::domain::error::StockevalError;
use crate::ports::market_port::MarketDataPort;

pub const NAME: &str = "sina";
const URL: &str =
    "http://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketData.getKLineData";
/// Minutes per bar; 240 is one trading day.
const DAILY_SCALE: &str = "240";

#[derive(Debug, Deserialize)]
struct KlineItem {
    day: String,
    open: Value,
    high: Value,
    low: Value,
    close: Value,
    volume: Value,
    #[serde(default)]
    pct_chg: Option<Value>,
}

/// Numbers arrive as JSON strings or JSON numbers.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn parse_klines(body: &str) -> Result<Vec<Candle>, String> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let items: Vec<KlineItem> = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;

    let mut has_pct = !items.is_empty();
    let mut candles = Vec::with_capacity(items.len());
    for item in items {
        let date = NaiveDate::parse_from_str(item.day.get(..10).unwrap_or(&item.day), "%Y-%m-%d")
            .map_err(|e| format!("invalid day '{}': {}", item.day, e))?;
        let field = |name: &str, v: &Value| {
            number(v).ok_or_else(|| format!("invalid {} '{}' on {}", name, v, item.day))
        };
        let pct = item.pct_chg.as_ref().and_then(number);
        has_pct &= pct.is_some();
        candles.push(Candle {
            date,
            open: field("open", &item.open)?,
            high: field("high", &item.high)?,
            low: field("low", &item.low)?,
            close: field("close", &item.close)?,
            volume: field("volume", &item.volume)?.round() as i64,
            pct_change: pct.unwrap_or(0.0),
        });
    }
    Ok(normalize_series(candles, !has_pct))
}

pub struct SinaKline {
    client: Client,
}

impl SinaKline {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl MarketDataPort for SinaKline {
    fn fetch_candles(&self, symbol: &str, days: usize) -> Result<Vec<Candle>, StockevalError> {
        let datalen = days.to_string();
        let request = self.client.get(URL).query(&[
            ("symbol", symbol),
            ("scale", DAILY_SCALE),
            ("ma", "5"),
            ("datalen", datalen.as_str()),
        ]);
        let body = fetch_text(NAME, request, None)?;
        let candles = parse_klines(&body).map_err(|e| StockevalError::upstream(NAME, e))?;
        debug!(symbol, rows = candles.len(), "sina klines");
        Ok(candles)
    }
}
