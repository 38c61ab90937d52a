#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use stockeval::domain::candle::Candle;
use stockeval::domain::error::{NotifyError, StockevalError};
use stockeval::domain::news::NewsItem;
use stockeval::ports::market_port::MarketDataPort;
use stockeval::ports::news_port::NewsSource;
use stockeval::ports::notify_port::Notifier;
use stockeval::ports::sentiment_port::SentimentModel;

pub struct MockNewsSource {
    pub name: String,
    pub items: HashMap<String, Vec<NewsItem>>,
    pub error: Option<String>,
}

impl MockNewsSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: HashMap::new(),
            error: None,
        }
    }

    pub fn with_items(mut self, symbol: &str, titles: &[(&str, &str)]) -> Self {
        let items = titles
            .iter()
            .map(|(date, title)| NewsItem::new(*date, *title, &self.name))
            .collect();
        self.items.insert(symbol.to_string(), items);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl NewsSource for MockNewsSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, symbol: &str) -> Result<Vec<NewsItem>, StockevalError> {
        if let Some(reason) = &self.error {
            return Err(StockevalError::upstream(&self.name, reason.clone()));
        }
        Ok(self.items.get(symbol).cloned().unwrap_or_default())
    }
}

pub struct MockMarketData {
    pub data: HashMap<String, Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, symbol: &str, candles: Vec<Candle>) -> Self {
        self.data.insert(symbol.to_string(), candles);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn fetch_candles(&self, symbol: &str, days: usize) -> Result<Vec<Candle>, StockevalError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(StockevalError::upstream("mock", reason.clone()));
        }
        let mut candles = self.data.get(symbol).cloned().unwrap_or_default();
        if candles.len() > days {
            candles.drain(..candles.len() - days);
        }
        Ok(candles)
    }
}

/// Scores titles by substring: the first matching marker wins, else `default`.
pub struct FixedModel {
    pub markers: Vec<(String, f64)>,
    pub default: f64,
}

impl FixedModel {
    pub fn constant(score: f64) -> Self {
        Self {
            markers: Vec::new(),
            default: score,
        }
    }

    pub fn with_marker(mut self, marker: &str, score: f64) -> Self {
        self.markers.push((marker.to_string(), score));
        self
    }
}

impl SentimentModel for FixedModel {
    fn polarity(&self, text: &str) -> f64 {
        self.markers
            .iter()
            .find(|(m, _)| text.contains(m.as_str()))
            .map_or(self.default, |(_, s)| *s)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<(String, String)>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            fail: true,
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, subject: &str, content: &str) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Network("connection refused".into()));
        }
        self.sent
            .borrow_mut()
            .push((subject.to_string(), content.to_string()));
        Ok(())
    }
}

pub fn date(day_offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day_offset)
}

pub fn make_candle(day_offset: i64, close: f64, volume: i64) -> Candle {
    Candle {
        date: date(day_offset),
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume,
        pct_change: 0.0,
    }
}

/// `count` candles with a linear close path and constant volume.
pub fn trend(count: usize, start: f64, step: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| make_candle(i as i64, start + step * i as f64, 10_000))
        .collect()
}
