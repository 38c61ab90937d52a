//! Eastmoney daily kline JSON (`push2his ... /kline/get`).
//!
//! `data.klines` is a list of comma-joined rows in `fields2` order:
//! date, open, close, high, low, volume, amount, amplitude, pct, change, turnover.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::adapters::http::fetch_text;
use crate::domain::candle::{normalize_series, Candle};
use crate::domain::error::StockevalError;
use crate::ports::market_port::MarketDataPort;

pub const NAME: &str = "eastmoney";
const URL: &str = "http://push2his.eastmoney.com/api/qt/stock/kline/get";
const FIELDS1: &str = "f1,f2,f3,f4,f5,f6";
const FIELDS2: &str = "f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61";
const PCT_COLUMN: usize = 8;

#[derive(Debug, Deserialize)]
struct KlineResponse {
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

/// `sh603259` → `1.603259`; Shenzhen and Beijing boards use market `0`.
pub fn secid(symbol: &str) -> String {
    let digits = symbol.get(2..).unwrap_or(symbol);
    let market = if symbol.starts_with("sh") { 1 } else { 0 };
    format!("{}.{}", market, digits)
}

fn parse_row(line: &str) -> Result<(Candle, bool), String> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 6 {
        return Err(format!("short kline row '{}'", line));
    }
    let num = |i: usize| -> Result<f64, String> {
        parts[i]
            .parse::<f64>()
            .map_err(|_| format!("invalid column {} in '{}'", i, line))
    };
    let date = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}': {}", parts[0], e))?;
    let pct = parts.get(PCT_COLUMN).and_then(|p| p.parse::<f64>().ok());
    let candle = Candle {
        date,
        open: num(1)?,
        close: num(2)?,
        high: num(3)?,
        low: num(4)?,
        volume: num(5)?.round() as i64,
        pct_change: pct.unwrap_or(0.0),
    };
    Ok((candle, pct.is_some()))
}

pub fn parse_klines(body: &str) -> Result<Vec<Candle>, String> {
    let resp: KlineResponse = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let Some(data) = resp.data else {
        return Ok(Vec::new());
    };

    let mut has_pct = !data.klines.is_empty();
    let mut candles = Vec::with_capacity(data.klines.len());
    for line in &data.klines {
        let (candle, pct_reported) = parse_row(line)?;
        has_pct &= pct_reported;
        candles.push(candle);
    }
    Ok(normalize_series(candles, !has_pct))
}

pub struct EastmoneyKline {
    client: Client,
}

impl EastmoneyKline {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl MarketDataPort for EastmoneyKline {
    fn fetch_candles(&self, symbol: &str, days: usize) -> Result<Vec<Candle>, StockevalError> {
        let secid = secid(symbol);
        let limit = days.to_string();
        let request = self.client.get(URL).query(&[
            ("secid", secid.as_str()),
            ("fields1", FIELDS1),
            ("fields2", FIELDS2),
            ("klt", "101"),
            ("fqt", "1"),
            ("beg", "0"),
            ("end", "20500101"),
            ("lmt", limit.as_str()),
        ]);
        let body = fetch_text(NAME, request, None)?;
        let mut candles = parse_klines(&body).map_err(|e| StockevalError::upstream(NAME, e))?;
        if candles.len() > days {
            candles.drain(..candles.len() - days);
        }
        debug!(symbol, secid = %secid, rows = candles.len(), "eastmoney klines");
        Ok(candles)
    }
}
