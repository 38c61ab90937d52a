//! Configuration validation.
//!
//! Validates all config fields before any stock is analyzed. Defaults here
//! match the ones the CLI uses when building settings.

use crate::domain::analysis::StockTarget;
use crate::domain::error::StockevalError;
use crate::ports::config_port::ConfigPort;

pub const NEWS_SOURCES: &[&str] = &["sina", "eastmoney", "xueqiu"];
pub const MARKET_SOURCES: &[&str] = &["sina", "eastmoney", "csv"];
pub const DEFAULT_NEWS_SOURCES: &[&str] = &["sina", "eastmoney", "xueqiu"];
pub const DEFAULT_MARKET_SOURCES: &[&str] = &["sina", "eastmoney"];

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Full validation, including a non-empty `[analysis] stocks` list.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    validate_stocks(config)?;
    validate_settings(config)
}

/// Everything except the stock list, for runs where stocks come from the
/// command line.
pub fn validate_settings(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    validate_news(config)?;
    validate_market(config)?;
    validate_weights(config)?;
    validate_thresholds(config)?;
    validate_tiers(config)?;
    validate_report(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StockevalError {
    StockevalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse `[analysis] stocks` into targets.
pub fn parse_stocks(config: &dyn ConfigPort) -> Result<Vec<StockTarget>, StockevalError> {
    let entries = config.get_list("analysis", "stocks").unwrap_or_default();
    entries
        .iter()
        .map(|e| StockTarget::parse(e).map_err(|reason| invalid("analysis", "stocks", reason)))
        .collect()
}

fn validate_stocks(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    if parse_stocks(config)?.is_empty() {
        return Err(StockevalError::ConfigMissing {
            section: "analysis".to_string(),
            key: "stocks".to_string(),
        });
    }
    Ok(())
}

fn validate_source_names(
    config: &dyn ConfigPort,
    section: &str,
    known: &[&str],
) -> Result<Vec<String>, StockevalError> {
    let Some(names) = config.get_list(section, "sources") else {
        return Ok(Vec::new());
    };
    if names.is_empty() {
        return Err(invalid(section, "sources", "at least one source is required"));
    }
    for name in &names {
        if !known.contains(&name.to_lowercase().as_str()) {
            return Err(invalid(
                section,
                "sources",
                format!("unknown source '{}', expected one of {}", name, known.join(", ")),
            ));
        }
    }
    Ok(names)
}

fn validate_news(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    validate_source_names(config, "news", NEWS_SOURCES)?;
    if config.get_int("news", "sina_pages", 2) < 1 {
        return Err(invalid("news", "sina_pages", "sina_pages must be at least 1"));
    }
    if config.get_int("news", "request_delay_ms", 1000) < 0 {
        return Err(invalid(
            "news",
            "request_delay_ms",
            "request_delay_ms must be non-negative",
        ));
    }
    if config.get_int("news", "timeout_secs", 10) < 1 {
        return Err(invalid("news", "timeout_secs", "timeout_secs must be at least 1"));
    }
    Ok(())
}

fn validate_market(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    let names = validate_source_names(config, "market", MARKET_SOURCES)?;
    if config.get_int("market", "days", 100) < 1 {
        return Err(invalid("market", "days", "days must be at least 1"));
    }
    let wants_csv = names.iter().any(|n| n.eq_ignore_ascii_case("csv"));
    let has_dir = config
        .get_string("market", "csv_dir")
        .is_some_and(|d| !d.trim().is_empty());
    if wants_csv && !has_dir {
        return Err(StockevalError::ConfigMissing {
            section: "market".to_string(),
            key: "csv_dir".to_string(),
        });
    }
    Ok(())
}

fn validate_weights(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    let sentiment = config.get_double("scoring", "sentiment_weight", 0.4);
    let technical = config.get_double("scoring", "technical_weight", 0.6);
    for (key, value) in [("sentiment_weight", sentiment), ("technical_weight", technical)] {
        if !(0.0..=1.0).contains(&value) {
            return Err(invalid("scoring", key, format!("{} must be between 0 and 1", key)));
        }
    }
    if (sentiment + technical - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(invalid(
            "scoring",
            "technical_weight",
            format!(
                "sentiment_weight + technical_weight must equal 1 (got {})",
                sentiment + technical
            ),
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    let positive = config.get_double("scoring", "positive_threshold", 0.7);
    let negative = config.get_double("scoring", "negative_threshold", 0.3);
    if !(0.0..=1.0).contains(&positive) {
        return Err(invalid(
            "scoring",
            "positive_threshold",
            "positive_threshold must be between 0 and 1",
        ));
    }
    if !(0.0..=1.0).contains(&negative) || negative >= positive {
        return Err(invalid(
            "scoring",
            "negative_threshold",
            "negative_threshold must be between 0 and positive_threshold",
        ));
    }
    if config.get_double("scoring", "label_ratio", 1.5) < 1.0 {
        return Err(invalid("scoring", "label_ratio", "label_ratio must be at least 1"));
    }
    Ok(())
}

fn validate_tiers(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    let tiers = [
        ("watch", config.get_double("scoring", "watch", 30.0)),
        ("hold", config.get_double("scoring", "hold", 45.0)),
        ("buy", config.get_double("scoring", "buy", 65.0)),
        ("strong_buy", config.get_double("scoring", "strong_buy", 80.0)),
    ];
    let mut previous = 0.0;
    for (key, value) in tiers {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid("scoring", key, format!("{} must be between 0 and 100", key)));
        }
        if value <= previous && key != "watch" {
            return Err(invalid(
                "scoring",
                key,
                "tier bounds must increase: watch < hold < buy < strong_buy",
            ));
        }
        previous = value;
    }
    Ok(())
}

fn validate_report(config: &dyn ConfigPort) -> Result<(), StockevalError> {
    if config.get_int("report", "news_limit", 20) < 0 {
        return Err(invalid("report", "news_limit", "news_limit must be non-negative"));
    }
    Ok(())
}
