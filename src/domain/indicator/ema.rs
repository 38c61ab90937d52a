//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Every bar is valid; there is no SMA warmup.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(period));
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let values = ema_values(&closes, period)
        .into_iter()
        .zip(candles)
        .map(|(ema, candle)| IndicatorPoint {
            date: candle.date,
            valid: true,
            value: IndicatorValue::Simple(ema),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// EMA over an arbitrary input sequence, seeded with its first element.
pub fn ema_values(input: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return Vec::new();
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(input.len());
    let mut prev: Option<f64> = None;
    for &x in input {
        let ema = match prev {
            None => x,
            Some(p) => x * k + p * (1.0 - k),
        };
        out.push(ema);
        prev = Some(ema);
    }
    out
}
