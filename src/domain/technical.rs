//! Technical snapshot over a trailing candle series.
//!
//! Computes MA5/10/20, EMA12/26, MACD and KDJ for the whole series, then
//! reduces them to the values of the most recent candle plus the volume and
//! overbought/oversold flags the scorer consumes.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::candle::Candle;
use crate::domain::error::StockevalError;
use crate::domain::indicator::{
    calculate_ema, calculate_kdj, calculate_macd, calculate_sma, IndicatorSeries, IndicatorType,
    IndicatorValue,
};
use crate::domain::indicator::{kdj, macd};

pub const MA_PERIODS: [usize; 3] = [5, 10, 20];
pub const VOLUME_LOOKBACK: usize = 5;
pub const VOLUME_SURGE_RATIO: f64 = 1.2;
pub const OVERSOLD_LEVEL: f64 = 20.0;
pub const OVERBOUGHT_LEVEL: f64 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub pct_change: f64,
    pub volume: i64,
    pub ma5: f64,
    pub ma10: f64,
    pub ma20: f64,
    pub ema12: f64,
    pub ema26: f64,
    pub diff: f64,
    pub dea: f64,
    pub macd_hist: f64,
    pub k: f64,
    pub d: f64,
    pub j: f64,
    pub volume_high: bool,
    pub oversold: bool,
    pub overbought: bool,
}

impl TechnicalSnapshot {
    /// close > MA5 > MA10 > MA20
    pub fn bullish_alignment(&self) -> bool {
        self.close > self.ma5 && self.ma5 > self.ma10 && self.ma10 > self.ma20
    }

    /// close < MA5 < MA10 < MA20
    pub fn bearish_alignment(&self) -> bool {
        self.close < self.ma5 && self.ma5 < self.ma10 && self.ma10 < self.ma20
    }

    pub fn macd_bullish(&self) -> bool {
        self.diff > self.dea
    }

    /// Short label for the KDJ zone.
    pub fn signal_label(&self) -> &'static str {
        if self.oversold {
            "超卖"
        } else if self.overbought {
            "超买"
        } else {
            "正常"
        }
    }
}

/// Full result of the technical stage for one stock.
#[derive(Debug, Clone)]
pub struct TechnicalAnalysis {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub series: HashMap<IndicatorType, IndicatorSeries>,
    pub snapshot: TechnicalSnapshot,
}

impl TechnicalAnalysis {
    pub fn series(&self, indicator: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator)
    }
}

pub fn indicator_set() -> Vec<IndicatorType> {
    let mut set: Vec<IndicatorType> = MA_PERIODS.iter().map(|&p| IndicatorType::Sma(p)).collect();
    set.push(IndicatorType::Ema(macd::DEFAULT_FAST));
    set.push(IndicatorType::Ema(macd::DEFAULT_SLOW));
    set.push(IndicatorType::Macd {
        fast: macd::DEFAULT_FAST,
        slow: macd::DEFAULT_SLOW,
        signal: macd::DEFAULT_SIGNAL,
    });
    set.push(IndicatorType::Kdj(kdj::DEFAULT_PERIOD));
    set
}

pub fn compute_indicators(
    candles: &[Candle],
    indicators: &[IndicatorType],
) -> HashMap<IndicatorType, IndicatorSeries> {
    indicators
        .iter()
        .map(|ind| {
            let series = match ind {
                IndicatorType::Sma(p) => calculate_sma(candles, *p),
                IndicatorType::Ema(p) => calculate_ema(candles, *p),
                IndicatorType::Macd { fast, slow, signal } => {
                    calculate_macd(candles, *fast, *slow, *signal)
                }
                IndicatorType::Kdj(p) => calculate_kdj(candles, *p),
            };
            (ind.clone(), series)
        })
        .collect()
}

/// Latest volume > 1.2 x mean of the five candles before it. With five or
/// fewer candles the mean covers the whole series.
pub fn volume_surge(candles: &[Candle]) -> bool {
    let Some(latest) = candles.last() else {
        return false;
    };
    let baseline: &[Candle] = if candles.len() > VOLUME_LOOKBACK {
        &candles[candles.len() - 1 - VOLUME_LOOKBACK..candles.len() - 1]
    } else {
        candles
    };
    let avg = baseline.iter().map(|c| c.volume as f64).sum::<f64>() / baseline.len() as f64;
    latest.volume as f64 > VOLUME_SURGE_RATIO * avg
}

/// Compute every indicator and reduce to a snapshot of the latest candle.
///
/// Fails with `DataUnavailable` on an empty series.
pub fn analyze_technical(
    symbol: &str,
    candles: Vec<Candle>,
) -> Result<TechnicalAnalysis, StockevalError> {
    let Some(latest) = candles.last().cloned() else {
        return Err(StockevalError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "no candles returned".into(),
        });
    };

    let series = compute_indicators(&candles, &indicator_set());

    // Undefined MAs (short history) fall back to the close so that neither
    // alignment check can fire.
    let ma = |p: usize| {
        series
            .get(&IndicatorType::Sma(p))
            .and_then(IndicatorSeries::latest_simple)
            .unwrap_or(latest.close)
    };
    let ema = |p: usize| {
        series
            .get(&IndicatorType::Ema(p))
            .and_then(IndicatorSeries::latest_simple)
            .unwrap_or(latest.close)
    };

    let (diff, dea, macd_hist) = match series
        .get(&IndicatorType::Macd {
            fast: macd::DEFAULT_FAST,
            slow: macd::DEFAULT_SLOW,
            signal: macd::DEFAULT_SIGNAL,
        })
        .and_then(|s| s.values.last())
        .map(|p| &p.value)
    {
        Some(IndicatorValue::Macd {
            diff,
            dea,
            histogram,
        }) => (*diff, *dea, *histogram),
        _ => (0.0, 0.0, 0.0),
    };

    // K/D are reported even during warmup; they hold at the 50 seed.
    let (k, d, j) = match series
        .get(&IndicatorType::Kdj(kdj::DEFAULT_PERIOD))
        .and_then(|s| s.values.last())
        .map(|p| &p.value)
    {
        Some(IndicatorValue::Kdj { k, d, j }) => (*k, *d, *j),
        _ => (50.0, 50.0, 50.0),
    };

    let snapshot = TechnicalSnapshot {
        date: latest.date,
        close: latest.close,
        pct_change: latest.pct_change,
        volume: latest.volume,
        ma5: ma(5),
        ma10: ma(10),
        ma20: ma(20),
        ema12: ema(macd::DEFAULT_FAST),
        ema26: ema(macd::DEFAULT_SLOW),
        diff,
        dea,
        macd_hist,
        k,
        d,
        j,
        volume_high: volume_surge(&candles),
        oversold: k < OVERSOLD_LEVEL && d < OVERSOLD_LEVEL,
        overbought: k > OVERBOUGHT_LEVEL && d > OVERBOUGHT_LEVEL,
    };

    Ok(TechnicalAnalysis {
        symbol: symbol.to_string(),
        candles,
        series,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn candle(i: usize, close: f64, volume: i64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume,
            pct_change: 0.0,
        }
    }

    fn trend(count: usize, start: f64, step: f64) -> Vec<Candle> {
        (0..count)
            .map(|i| candle(i, start + step * i as f64, 10_000))
            .collect()
    }

    #[test]
    fn empty_series_is_data_unavailable() {
        let err = analyze_technical("sh603259", Vec::new()).unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn uptrend_snapshot() {
        let analysis = analyze_technical("sh603259", trend(100, 50.0, 0.5)).unwrap();
        let snap = &analysis.snapshot;

        assert_eq!(analysis.candles.len(), 100);
        assert_abs_diff_eq!(snap.close, 99.5, epsilon = 1e-12);
        // MA5 of the last five closes 97.5..=99.5
        assert_abs_diff_eq!(snap.ma5, 98.5, epsilon = 1e-9);
        assert!(snap.bullish_alignment());
        assert!(!snap.bearish_alignment());
        assert!(snap.macd_bullish());
        assert!(snap.overbought);
        assert!(!snap.oversold);
        assert_abs_diff_eq!(snap.macd_hist, 2.0 * (snap.diff - snap.dea), epsilon = 1e-12);
        assert_abs_diff_eq!(snap.j, 3.0 * snap.k - 2.0 * snap.d, epsilon = 1e-12);
    }

    #[test]
    fn downtrend_snapshot() {
        let analysis = analyze_technical("sz000651", trend(100, 100.0, -0.5)).unwrap();
        let snap = &analysis.snapshot;

        assert!(snap.bearish_alignment());
        assert!(!snap.macd_bullish());
        assert!(snap.oversold);
        assert_eq!(snap.signal_label(), "超卖");
    }

    #[test]
    fn short_history_has_no_alignment() {
        let analysis = analyze_technical("sh600000", trend(8, 10.0, 1.0)).unwrap();
        let snap = &analysis.snapshot;

        assert_eq!(snap.ma20, snap.close);
        assert!(!snap.bullish_alignment());
        assert!(!snap.bearish_alignment());
        assert_eq!((snap.k, snap.d), (50.0, 50.0));
    }

    #[test]
    fn all_indicator_series_are_computed() {
        let analysis = analyze_technical("sh603259", trend(30, 10.0, 0.1)).unwrap();
        for ind in indicator_set() {
            let series = analysis.series(&ind).unwrap();
            assert_eq!(series.values.len(), 30, "{ind}");
        }
    }

    #[test]
    fn volume_surge_excludes_latest_day() {
        let mut candles: Vec<Candle> = (0..10).map(|i| candle(i, 10.0, 1_000)).collect();
        candles.push(candle(10, 10.0, 1_201));
        assert!(volume_surge(&candles));

        let last = candles.len() - 1;
        candles[last].volume = 1_200;
        assert!(!volume_surge(&candles));
    }

    #[test]
    fn volume_surge_short_series_uses_all_candles() {
        let candles = vec![candle(0, 10.0, 100), candle(1, 10.0, 100), candle(2, 10.0, 400)];
        // mean(100, 100, 400) = 200; 400 > 240
        assert!(volume_surge(&candles));
        assert!(!volume_surge(&candles[..1]));
        assert!(!volume_surge(&[]));
    }

    #[test]
    fn signal_label_normal() {
        let analysis = analyze_technical("sh603259", trend(3, 10.0, 0.0)).unwrap();
        assert_eq!(analysis.snapshot.signal_label(), "正常");
    }
}
