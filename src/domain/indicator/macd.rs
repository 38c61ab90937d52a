//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! DIFF = EMA(fast) - EMA(slow)
//! DEA  = EMA(signal) of DIFF, seeded with the first DIFF
//! Histogram = 2 * (DIFF - DEA), the A-share charting convention
//!
//! Default parameters: fast=12, slow=26, signal=9. Every bar is valid.

use crate::domain::candle::Candle;
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    candles: &[Candle],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if candles.is_empty() || fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let diff: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let dea = ema_values(&diff, signal_period);

    let values = candles
        .iter()
        .enumerate()
        .map(|(i, candle)| IndicatorPoint {
            date: candle.date,
            valid: true,
            value: IndicatorValue::Macd {
                diff: diff[i],
                dea: dea[i],
                histogram: 2.0 * (diff[i] - dea[i]),
            },
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

pub fn calculate_macd_default(candles: &[Candle]) -> IndicatorSeries {
    calculate_macd(candles, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
