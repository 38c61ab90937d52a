//! Simple moving average of closes.
//!
//! MA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_sma(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Sma(period));
    }

    let mut values = Vec::with_capacity(candles.len());
    let mut sum = 0.0;

    for (i, candle) in candles.iter().enumerate() {
        sum += candle.close;
        if i >= period {
            sum -= candles[i - period].close;
        }

        let valid = i + 1 >= period;
        values.push(IndicatorPoint {
            date: candle.date,
            valid,
            value: IndicatorValue::Simple(if valid { sum / period as f64 } else { 0.0 }),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    }
}
