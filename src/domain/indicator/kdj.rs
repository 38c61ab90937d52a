//! KDJ stochastic oscillator.
//!
//! RSV[i] = (C[i] - LLV(L, n)) / (HHV(H, n) - LLV(L, n)) * 100
//! K[i]   = K[i-1] * 2/3 + RSV[i] * 1/3,  K[-1] = 50
//! D[i]   = D[i-1] * 2/3 + K[i] * 1/3,    D[-1] = 50
//! J[i]   = 3K[i] - 2D[i]
//!
//! RSV is undefined before n bars and on a flat window (HHV == LLV); an
//! undefined RSV takes the previous K, which holds K and D at 50 through warmup.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_PERIOD: usize = 9;
const SEED: f64 = 50.0;

pub fn calculate_kdj(candles: &[Candle], period: usize) -> IndicatorSeries {
    if period == 0 || candles.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Kdj(period));
    }

    let mut values = Vec::with_capacity(candles.len());
    let mut k = SEED;
    let mut d = SEED;

    for (i, candle) in candles.iter().enumerate() {
        let rsv = raw_stochastic(candles, i, period).unwrap_or(k);
        k = k * 2.0 / 3.0 + rsv / 3.0;
        d = d * 2.0 / 3.0 + k / 3.0;

        values.push(IndicatorPoint {
            date: candle.date,
            valid: i + 1 >= period,
            value: IndicatorValue::Kdj {
                k,
                d,
                j: 3.0 * k - 2.0 * d,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Kdj(period),
        values,
    }
}

/// RSV for the window ending at `i`, or `None` when it is undefined.
pub fn raw_stochastic(candles: &[Candle], i: usize, period: usize) -> Option<f64> {
    if period == 0 || i + 1 < period || i >= candles.len() {
        return None;
    }
    let window = &candles[i + 1 - period..=i];
    let lowest = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let highest = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let range = highest - lowest;
    if range <= 0.0 || !range.is_finite() {
        return None;
    }
    Some((candles[i].close - lowest) / range * 100.0)
}
