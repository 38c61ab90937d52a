//! CSV file market-data adapter for offline runs.
//!
//! Reads `{base_path}/{symbol}.csv` with a header row
//! `date,open,high,low,close,volume[,pct_change]`.

use crate::domain::candle::{normalize_series, Candle};
use crate::domain::error::StockevalError;
use crate::ports::market_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

const SOURCE: &str = "csv";

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    pct_change: Option<f64>,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

impl MarketDataPort for CsvAdapter {
    fn fetch_candles(&self, symbol: &str, days: usize) -> Result<Vec<Candle>, StockevalError> {
        let path = self.csv_path(symbol);
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| {
                StockevalError::upstream(SOURCE, format!("failed to read {}: {}", path.display(), e))
            })?;

        let mut candles = Vec::new();
        let mut has_pct = true;

        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| {
                StockevalError::upstream(SOURCE, format!("CSV parse error: {}", e))
            })?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|e| {
                StockevalError::upstream(
                    SOURCE,
                    format!("invalid date '{}' on row {}: {}", row.date, line + 1, e),
                )
            })?;
            has_pct &= row.pct_change.is_some();
            candles.push(Candle {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.round() as i64,
                pct_change: row.pct_change.unwrap_or(0.0),
            });
        }

        let mut candles = normalize_series(candles, !has_pct);
        if candles.len() > days {
            candles.drain(..candles.len() - days);
        }
        debug!(symbol, rows = candles.len(), path = %path.display(), "csv candles loaded");
        Ok(candles)
    }
}
