//! Ordered chain of market-data sources; first non-empty series wins.

use tracing::{info, warn};

use crate::domain::candle::Candle;
use crate::domain::error::StockevalError;
use crate::ports::market_port::MarketDataPort;

pub struct FallbackMarketData {
    sources: Vec<(String, Box<dyn MarketDataPort>)>,
}

impl FallbackMarketData {
    pub fn new(sources: Vec<(String, Box<dyn MarketDataPort>)>) -> Self {
        Self { sources }
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl MarketDataPort for FallbackMarketData {
    fn fetch_candles(&self, symbol: &str, days: usize) -> Result<Vec<Candle>, StockevalError> {
        let mut reasons = Vec::new();
        for (name, source) in &self.sources {
            match source.fetch_candles(symbol, days) {
                Ok(candles) if !candles.is_empty() => {
                    info!(symbol, source = %name, rows = candles.len(), "market data fetched");
                    return Ok(candles);
                }
                Ok(_) => {
                    warn!(symbol, source = %name, "market source returned no rows");
                    reasons.push(format!("{}: no rows", name));
                }
                Err(e) => {
                    warn!(symbol, source = %name, error = %e, "market source failed");
                    reasons.push(e.to_string());
                }
            }
        }
        let reason = if reasons.is_empty() {
            "no market data sources configured".to_string()
        } else {
            reasons.join("; ")
        };
        Err(StockevalError::DataUnavailable {
            symbol: symbol.to_string(),
            reason,
        })
    }
}


impl std::fmt::Debug for FallbackMarketData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackMarketData")
            .field("sources", &self.source_names())
            .finish()
    }
}
