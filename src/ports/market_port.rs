//! Daily market data port.

use crate::domain::candle::Candle;
use crate::domain::error::StockevalError;

pub trait MarketDataPort {
    /// Fetch up to `days` trailing daily candles for `symbol`, ascending by date.
    ///
    /// An empty result is not an error at this layer; the analysis pipeline
    /// turns it into `DataUnavailable`.
    fn fetch_candles(&self, symbol: &str, days: usize) -> Result<Vec<Candle>, StockevalError>;
}
