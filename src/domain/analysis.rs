//! Per-stock analysis pipeline.
//!
//! news → sentiment → market data → technical snapshot → score. News sources
//! fail soft and contribute nothing; market data fails hard with
//! `DataUnavailable` and no report is produced for that stock.

use std::fmt;
use std::thread;
use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::domain::error::StockevalError;
use crate::domain::news::{dedupe_by_title, risk_alerts, NewsItem, DEFAULT_RISK_KEYWORDS};
use crate::domain::scoring::{score, ScoreResult, ScoringConfig};
use crate::domain::sentiment::{summarize, SentimentSummary};
use crate::domain::technical::{analyze_technical, TechnicalAnalysis};
use crate::ports::market_port::MarketDataPort;
use crate::ports::news_port::NewsSource;
use crate::ports::sentiment_port::SentimentModel;

const EXCHANGE_PREFIXES: [&str; 3] = ["sh", "sz", "bj"];

/// An exchange-prefixed ticker plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockTarget {
    pub code: String,
    pub name: String,
}

impl StockTarget {
    pub fn new(code: &str, name: Option<&str>) -> Result<Self, String> {
        let code = code.trim().to_lowercase();
        validate_code(&code)?;
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => code.clone(),
        };
        Ok(Self { code, name })
    }

    /// Parse `sh603259:药明康德` or a bare `sh603259`.
    pub fn parse(entry: &str) -> Result<Self, String> {
        match entry.split_once(':') {
            Some((code, name)) => Self::new(code, Some(name)),
            None => Self::new(entry, None),
        }
    }

    /// Exchange prefix, `sh`/`sz`/`bj`.
    pub fn exchange(&self) -> &str {
        &self.code[..2]
    }

    /// Six-digit numeric code without the exchange prefix.
    pub fn digits(&self) -> &str {
        &self.code[2..]
    }
}

impl fmt::Display for StockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.code)
    }
}

pub fn validate_code(code: &str) -> Result<(), String> {
    let valid = code.len() == 8
        && EXCHANGE_PREFIXES.iter().any(|p| code.starts_with(p))
        && code[2..].chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not an exchange-prefixed ticker like sh603259",
            code
        ))
    }
}

/// What one news source contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    pub source: String,
    pub count: usize,
    pub error: Option<String>,
}

/// Merged headlines plus per-source bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewsFetch {
    pub items: Vec<NewsItem>,
    pub outcomes: Vec<SourceOutcome>,
}

impl NewsFetch {
    pub fn failures(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }

    /// Number of deduplicated items that came from `source`.
    pub fn kept_from(&self, source: &str) -> usize {
        self.items.iter().filter(|i| i.source == source).count()
    }
}

/// Query every source in order, merge, then dedupe by title.
///
/// `delay` is slept between consecutive sources, never before the first.
pub fn fetch_all_news(sources: &[Box<dyn NewsSource>], symbol: &str, delay: Duration) -> NewsFetch {
    let mut merged = Vec::new();
    let mut outcomes = Vec::with_capacity(sources.len());

    for (i, source) in sources.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        match source.fetch(symbol) {
            Ok(items) => {
                info!(source = source.name(), count = items.len(), "news fetched");
                outcomes.push(SourceOutcome {
                    source: source.name().to_string(),
                    count: items.len(),
                    error: None,
                });
                merged.extend(items);
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "news source failed");
                outcomes.push(SourceOutcome {
                    source: source.name().to_string(),
                    count: 0,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let items = dedupe_by_title(merged);
    debug!(symbol, unique = items.len(), "news merged");
    NewsFetch { items, outcomes }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub scoring: ScoringConfig,
    pub risk_keywords: Vec<String>,
    pub news_delay: Duration,
    pub days: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            risk_keywords: DEFAULT_RISK_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            news_delay: Duration::from_millis(1000),
            days: 100,
        }
    }
}

/// Everything the reporters need for one stock.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub target: StockTarget,
    pub generated_at: NaiveDateTime,
    pub news: NewsFetch,
    pub sentiment: SentimentSummary,
    pub technical: TechnicalAnalysis,
    pub score: ScoreResult,
    pub alerts: Vec<NewsItem>,
    pub sentiment_weight: f64,
    pub technical_weight: f64,
}

/// Wires the ports together for a batch of stocks.
pub struct Analyzer<'a> {
    pub news_sources: &'a [Box<dyn NewsSource>],
    pub market: &'a dyn MarketDataPort,
    pub model: &'a dyn SentimentModel,
    pub settings: &'a AnalysisSettings,
}

impl Analyzer<'_> {
    pub fn run(&self, target: &StockTarget) -> Result<AnalysisReport, StockevalError> {
        let news = fetch_all_news(self.news_sources, &target.code, self.settings.news_delay);
        self.run_with_news(target, news)
    }

    /// Remaining stages once headlines are in hand.
    pub fn run_with_news(
        &self,
        target: &StockTarget,
        news: NewsFetch,
    ) -> Result<AnalysisReport, StockevalError> {
        let scoring = &self.settings.scoring;
        let sentiment = summarize(&news.items, self.model, &scoring.thresholds);
        info!(
            stock = %target,
            label = %sentiment.label,
            positive = sentiment.positive,
            neutral = sentiment.neutral,
            negative = sentiment.negative,
            "sentiment summarized"
        );

        let candles = self
            .market
            .fetch_candles(&target.code, self.settings.days)
            .map_err(|e| match e {
                StockevalError::DataUnavailable { .. } => e,
                other => StockevalError::DataUnavailable {
                    symbol: target.code.clone(),
                    reason: other.to_string(),
                },
            })?;
        let technical = analyze_technical(&target.code, candles)?;

        let score = score(
            sentiment.label,
            sentiment.average,
            &technical.snapshot,
            scoring,
        );
        info!(
            stock = %target,
            final_score = score.final_score,
            recommendation = %score.recommendation,
            "scored"
        );

        let alerts = risk_alerts(&news.items, &self.settings.risk_keywords)
            .into_iter()
            .cloned()
            .collect();

        Ok(AnalysisReport {
            target: target.clone(),
            generated_at: chrono::Local::now().naive_local(),
            news,
            sentiment,
            technical,
            score,
            alerts,
            sentiment_weight: scoring.sentiment_weight,
            technical_weight: scoring.technical_weight,
        })
    }
}
