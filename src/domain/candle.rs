//! Daily candle representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    /// Daily change in percent, e.g. `4.0` for +4%.
    pub pct_change: f64,
}

impl Candle {
    /// (close - prev_close) / prev_close * 100
    pub fn change_from(&self, prev_close: f64) -> f64 {
        if prev_close == 0.0 {
            0.0
        } else {
            (self.close - prev_close) / prev_close * 100.0
        }
    }
}

/// Sort ascending by date, keep the last row of any repeated date, and fill
/// in `pct_change` from the previous close for sources that do not report it.
pub fn normalize_series(candles: Vec<Candle>, derive_pct: bool) -> Vec<Candle> {
    let mut sorted = candles;
    sorted.sort_by_key(|c| c.date);
    let mut candles: Vec<Candle> = Vec::with_capacity(sorted.len());
    for candle in sorted {
        match candles.last_mut() {
            Some(last) if last.date == candle.date => *last = candle,
            _ => candles.push(candle),
        }
    }
    if derive_pct {
        let mut prev_close: Option<f64> = None;
        for candle in candles.iter_mut() {
            candle.pct_change = prev_close.map_or(0.0, |p| candle.change_from(p));
            prev_close = Some(candle.close);
        }
    }
    candles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(day: u32, close: f64) -> Candle {
        Candle {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10_000,
            pct_change: 0.0,
        }
    }

    #[test]
    fn change_from_previous_close() {
        let bar = candle(2, 104.0);
        assert!((bar.change_from(100.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn change_from_zero_close_is_zero() {
        let bar = candle(2, 104.0);
        assert_eq!(bar.change_from(0.0), 0.0);
    }

    #[test]
    fn normalize_sorts_ascending() {
        let series = normalize_series(vec![candle(3, 12.0), candle(1, 10.0), candle(2, 11.0)], false);
        let days: Vec<u32> = series.iter().map(|c| chrono::Datelike::day(&c.date)).collect();
        assert_eq!(days, vec![1, 2, 3]);
    }

    #[test]
    fn normalize_keeps_last_row_of_repeated_date() {
        let series = normalize_series(
            vec![candle(1, 10.0), candle(2, 11.0), candle(2, 11.5), candle(3, 12.0)],
            true,
        );
        let closes: Vec<f64> = series.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![10.0, 11.5, 12.0]);
        assert!((series[1].pct_change - 15.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_derives_pct_change() {
        let series = normalize_series(vec![candle(2, 110.0), candle(1, 100.0)], true);
        assert_eq!(series[0].pct_change, 0.0);
        assert!((series[1].pct_change - 10.0).abs() < 1e-12);
    }

    #[test]
    fn normalize_keeps_reported_pct_change() {
        let mut bar = candle(1, 100.0);
        bar.pct_change = 2.5;
        let series = normalize_series(vec![bar], false);
        assert_eq!(series[0].pct_change, 2.5);
    }
}
