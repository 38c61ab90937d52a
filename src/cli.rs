//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{info, warn};

use crate::adapters::chart_svg::SvgChartAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::eastmoney_kline::{self, EastmoneyKline};
use crate::adapters::eastmoney_news::{self, EastmoneyNews};
use crate::adapters::fallback_market::FallbackMarketData;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http::build_client;
use crate::adapters::lexicon_model::LexiconModel;
use crate::adapters::serverchan_notifier::ServerChanNotifier;
use crate::adapters::sina_kline::{self, SinaKline};
use crate::adapters::sina_news::{self, SinaNews};
use crate::adapters::text_report::{render_summary, TextReportAdapter, DEFAULT_NEWS_LIMIT};
use crate::adapters::xueqiu_news::{self, XueqiuNews};
use crate::domain::analysis::{fetch_all_news, AnalysisSettings, Analyzer, StockTarget};
use crate::domain::config_validation::{
    parse_stocks, validate_config, validate_settings, DEFAULT_MARKET_SOURCES,
    DEFAULT_NEWS_SOURCES,
};
use crate::domain::error::StockevalError;
use crate::domain::news::DEFAULT_RISK_KEYWORDS;
use crate::domain::scoring::ScoringConfig;
use crate::domain::sentiment::{summarize, SentimentThresholds};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_port::MarketDataPort;
use crate::ports::news_port::NewsSource;
use crate::ports::notify_port::Notifier;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "stockeval",
    about = "A-share news sentiment and technical indicator evaluation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the configured stocks and write reports
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Analyze only this symbol, e.g. sh603259
        #[arg(long)]
        code: Option<String>,
        /// Display name for --code
        #[arg(long, requires = "code")]
        name: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_notify: bool,
        /// Read candles from <dir>/<symbol>.csv and skip news requests
        #[arg(long, value_name = "CSV_DIR")]
        offline: Option<PathBuf>,
    },
    /// Fetch and print merged headlines with their polarity
    News {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Analyze {
            config,
            code,
            name,
            output,
            no_notify,
            offline,
        } => run_analyze(
            &config,
            code.as_deref(),
            name.as_deref(),
            output.as_ref(),
            no_notify,
            offline.as_deref(),
        ),
        Command::News { config, code } => run_news(&config, &code),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn fail(e: &StockevalError) -> ExitCode {
    eprintln!("error: {e}");
    e.into()
}

pub fn build_scoring_config(config: &dyn ConfigPort) -> ScoringConfig {
    let d = ScoringConfig::default();
    let t = SentimentThresholds::default();
    ScoringConfig {
        sentiment_weight: config.get_double("scoring", "sentiment_weight", d.sentiment_weight),
        technical_weight: config.get_double("scoring", "technical_weight", d.technical_weight),
        thresholds: SentimentThresholds {
            positive: config.get_double("scoring", "positive_threshold", t.positive),
            negative: config.get_double("scoring", "negative_threshold", t.negative),
            label_ratio: config.get_double("scoring", "label_ratio", t.label_ratio),
        },
        macd_delta: config.get_double("scoring", "macd_delta", d.macd_delta),
        kdj_delta: config.get_double("scoring", "kdj_delta", d.kdj_delta),
        alignment_delta: config.get_double("scoring", "alignment_delta", d.alignment_delta),
        volume_delta: config.get_double("scoring", "volume_delta", d.volume_delta),
        momentum_delta: config.get_double("scoring", "momentum_delta", d.momentum_delta),
        strong_buy: config.get_double("scoring", "strong_buy", d.strong_buy),
        buy: config.get_double("scoring", "buy", d.buy),
        hold: config.get_double("scoring", "hold", d.hold),
        watch: config.get_double("scoring", "watch", d.watch),
        ..d
    }
}

pub fn build_settings(config: &dyn ConfigPort) -> AnalysisSettings {
    let d = AnalysisSettings::default();
    let risk_keywords = config
        .get_list("news", "risk_keywords")
        .filter(|list| !list.is_empty())
        .unwrap_or_else(|| DEFAULT_RISK_KEYWORDS.iter().map(|s| s.to_string()).collect());
    AnalysisSettings {
        scoring: build_scoring_config(config),
        risk_keywords,
        news_delay: news_delay(config),
        days: config.get_int("market", "days", d.days as i64).max(1) as usize,
    }
}

fn news_delay(config: &dyn ConfigPort) -> Duration {
    Duration::from_millis(config.get_int("news", "request_delay_ms", 1000).max(0) as u64)
}

fn source_list(config: &dyn ConfigPort, section: &str, defaults: &[&str]) -> Vec<String> {
    config
        .get_list(section, "sources")
        .unwrap_or_else(|| defaults.iter().map(|s| s.to_string()).collect())
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect()
}

pub fn build_http_client(config: &dyn ConfigPort) -> Result<Client, StockevalError> {
    let secs = config.get_int("news", "timeout_secs", 10).max(1) as u64;
    build_client(Duration::from_secs(secs))
}

pub fn build_news_sources(
    config: &dyn ConfigPort,
    client: &Client,
) -> Result<Vec<Box<dyn NewsSource>>, StockevalError> {
    let mut sources: Vec<Box<dyn NewsSource>> = Vec::new();
    for name in source_list(config, "news", DEFAULT_NEWS_SOURCES) {
        match name.as_str() {
            sina_news::NAME => {
                let pages = config.get_int("news", "sina_pages", 2).max(1) as usize;
                sources.push(Box::new(SinaNews::new(
                    client.clone(),
                    pages,
                    news_delay(config),
                )?));
            }
            eastmoney_news::NAME => sources.push(Box::new(EastmoneyNews::new(client.clone()))),
            xueqiu_news::NAME => sources.push(Box::new(XueqiuNews::new(client.clone()))),
            other => {
                return Err(StockevalError::ConfigInvalid {
                    section: "news".into(),
                    key: "sources".into(),
                    reason: format!("unknown source '{}'", other),
                })
            }
        }
    }
    Ok(sources)
}

/// Market chain from `[market] sources`, or a single CSV source when
/// `offline` names a directory.
pub fn build_market(
    config: &dyn ConfigPort,
    client: &Client,
    offline: Option<&Path>,
) -> Result<FallbackMarketData, StockevalError> {
    if let Some(dir) = offline {
        let csv: Box<dyn MarketDataPort> = Box::new(CsvAdapter::new(dir.to_path_buf()));
        return Ok(FallbackMarketData::new(vec![("csv".to_string(), csv)]));
    }

    let mut chain: Vec<(String, Box<dyn MarketDataPort>)> = Vec::new();
    for name in source_list(config, "market", DEFAULT_MARKET_SOURCES) {
        let source: Box<dyn MarketDataPort> = match name.as_str() {
            sina_kline::NAME => Box::new(SinaKline::new(client.clone())),
            eastmoney_kline::NAME => Box::new(EastmoneyKline::new(client.clone())),
            "csv" => {
                let dir = config
                    .get_string("market", "csv_dir")
                    .filter(|d| !d.trim().is_empty())
                    .ok_or_else(|| StockevalError::ConfigMissing {
                        section: "market".into(),
                        key: "csv_dir".into(),
                    })?;
                Box::new(CsvAdapter::new(PathBuf::from(dir.trim())))
            }
            other => {
                return Err(StockevalError::ConfigInvalid {
                    section: "market".into(),
                    key: "sources".into(),
                    reason: format!("unknown source '{}'", other),
                })
            }
        };
        chain.push((name, source));
    }
    Ok(FallbackMarketData::new(chain))
}

pub fn resolve_stocks(
    code_override: Option<&str>,
    name_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<StockTarget>, StockevalError> {
    if let Some(code) = code_override {
        let target =
            StockTarget::new(code, name_override).map_err(|reason| StockevalError::ConfigInvalid {
                section: "analysis".into(),
                key: "code".into(),
                reason,
            })?;
        return Ok(vec![target]);
    }
    parse_stocks(config)
}

pub fn resolve_output_dir(output: Option<&PathBuf>, config: &dyn ConfigPort) -> PathBuf {
    output.cloned().unwrap_or_else(|| {
        config
            .get_string("report", "output_dir")
            .filter(|d| !d.trim().is_empty())
            .map(|d| PathBuf::from(d.trim()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Per-batch result: reports written and the stocks that failed.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub written: Vec<PathBuf>,
    pub failures: Vec<(StockTarget, StockevalError)>,
}

impl BatchOutcome {
    /// Exit status of the first failure, or 0.
    pub fn exit_status(&self) -> u8 {
        self.failures
            .first()
            .map_or(0, |(_, e)| e.exit_status())
    }
}

/// Run every target through the analyzer. A failing stock is recorded and
/// the batch moves on; `extras` (charts) and the notifier only log on error.
pub fn run_analysis_pipeline(
    analyzer: &Analyzer<'_>,
    report: &dyn ReportPort,
    extras: &[&dyn ReportPort],
    notifier: Option<&dyn Notifier>,
    targets: &[StockTarget],
    output_dir: &Path,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (i, target) in targets.iter().enumerate() {
        eprintln!("[{}/{}] Analyzing {}", i + 1, targets.len(), target);

        let result = match analyzer.run(target) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("warning: skipping {} ({})", target, e);
                outcome.failures.push((target.clone(), e));
                continue;
            }
        };

        for failed in result.news.failures() {
            eprintln!(
                "  news source {} failed: {}",
                failed.source,
                failed.error.as_deref().unwrap_or("unknown error")
            );
        }
        eprintln!(
            "  {} headlines, sentiment {}, final score {:.1}, {}",
            result.news.items.len(),
            result.sentiment.label,
            result.score.final_score,
            result.score.recommendation
        );

        match report.write(&result, output_dir) {
            Ok(path) => {
                eprintln!("  Report written to {}", path.display());
                outcome.written.push(path);
            }
            Err(e) => {
                eprintln!("warning: report for {} failed ({})", target, e);
                outcome.failures.push((target.clone(), e));
                continue;
            }
        }

        for extra in extras {
            match extra.write(&result, output_dir) {
                Ok(path) => eprintln!("  Chart written to {}", path.display()),
                Err(e) => warn!(stock = %target, error = %e, "chart not written"),
            }
        }

        if let Some(notifier) = notifier {
            let (subject, body) = render_summary(&result);
            if let Err(e) = notifier.notify(&subject, &body) {
                warn!(stock = %target, error = %e, "notification failed");
            }
        }
    }

    outcome
}

fn run_analyze(
    config_path: &PathBuf,
    code_override: Option<&str>,
    name_override: Option<&str>,
    output: Option<&PathBuf>,
    no_notify: bool,
    offline: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Stage 2: Validate (the stock list is optional with --code)
    let validated = if code_override.is_some() {
        validate_settings(&config)
    } else {
        validate_config(&config)
    };
    if let Err(e) = validated {
        return fail(&e);
    }

    // Stage 3: Resolve stocks and settings
    let targets = match resolve_stocks(code_override, name_override, &config) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let settings = build_settings(&config);
    let output_dir = resolve_output_dir(output, &config);

    // Stage 4: Build adapters
    let client = match build_http_client(&config) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let news_sources = if offline.is_some() {
        eprintln!("Offline mode: news sources disabled");
        Vec::new()
    } else {
        match build_news_sources(&config, &client) {
            Ok(s) => s,
            Err(e) => return fail(&e),
        }
    };
    let market = match build_market(&config, &client, offline) {
        Ok(m) => m,
        Err(e) => return fail(&e),
    };
    info!(
        news = ?news_sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
        market = ?market.source_names(),
        "sources configured"
    );

    let model = LexiconModel::new();
    let news_limit = config
        .get_int("report", "news_limit", DEFAULT_NEWS_LIMIT as i64)
        .max(0) as usize;
    let report = TextReportAdapter::new(news_limit);
    let chart = SvgChartAdapter;
    let extras: Vec<&dyn ReportPort> = if config.get_bool("report", "chart", true) {
        vec![&chart as &dyn ReportPort]
    } else {
        Vec::new()
    };

    let notifier = if !no_notify && config.get_bool("notify", "enabled", false) {
        match ServerChanNotifier::from_key(
            client.clone(),
            config.get_string("notify", "serverchan_key"),
        ) {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %e, "notifications disabled");
                None
            }
        }
    } else {
        None
    };

    // Stage 5: Analyze every stock
    let analyzer = Analyzer {
        news_sources: &news_sources,
        market: &market,
        model: &model,
        settings: &settings,
    };
    let outcome = run_analysis_pipeline(
        &analyzer,
        &report,
        &extras,
        notifier.as_ref().map(|n| n as &dyn Notifier),
        &targets,
        &output_dir,
    );

    eprintln!(
        "\nDone: {} of {} stocks reported",
        outcome.written.len(),
        targets.len()
    );
    ExitCode::from(outcome.exit_status())
}

fn run_news(config_path: &PathBuf, code: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_settings(&config) {
        return fail(&e);
    }
    let target = match resolve_stocks(Some(code), None, &config) {
        Ok(mut t) => t.remove(0),
        Err(e) => return fail(&e),
    };

    let client = match build_http_client(&config) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let sources = match build_news_sources(&config, &client) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("Fetching news for {}...", target.code);
    let fetch = fetch_all_news(&sources, &target.code, news_delay(&config));
    for failed in fetch.failures() {
        eprintln!(
            "warning: {} failed: {}",
            failed.source,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    let scoring = build_scoring_config(&config);
    let summary = summarize(&fetch.items, &LexiconModel::new(), &scoring.thresholds);
    for headline in &summary.scored {
        println!(
            "{}\t{}\t{:.2}\t{}\t{}",
            headline.item.date,
            headline.polarity,
            headline.score,
            headline.item.source,
            headline.item.title
        );
    }

    eprintln!(
        "{} headlines: {} positive, {} neutral, {} negative ({})",
        summary.total(),
        summary.positive,
        summary.neutral,
        summary.negative,
        summary.label
    );
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&config) {
        return fail(&e);
    }
    let targets = match parse_stocks(&config) {
        Ok(t) => t,
        Err(e) => return fail(&e),
    };
    let settings = build_settings(&config);
    let scoring = &settings.scoring;

    eprintln!("\nStocks:");
    for target in &targets {
        eprintln!("  {}", target);
    }
    eprintln!("\nSources:");
    eprintln!(
        "  news:   {}",
        source_list(&config, "news", DEFAULT_NEWS_SOURCES).join(", ")
    );
    eprintln!(
        "  market: {}",
        source_list(&config, "market", DEFAULT_MARKET_SOURCES).join(", ")
    );
    eprintln!("  days:   {}", settings.days);
    eprintln!("\nScoring:");
    eprintln!(
        "  weights: sentiment {:.2}, technical {:.2}",
        scoring.sentiment_weight, scoring.technical_weight
    );
    eprintln!(
        "  polarity: positive > {:.2}, negative < {:.2}, label ratio {:.2}",
        scoring.thresholds.positive, scoring.thresholds.negative, scoring.thresholds.label_ratio
    );
    eprintln!(
        "  tiers: strong buy {:.0}, buy {:.0}, hold {:.0}, watch {:.0}",
        scoring.strong_buy, scoring.buy, scoring.hold, scoring.watch
    );
    eprintln!("  risk keywords: {}", settings.risk_keywords.join(", "));
    eprintln!(
        "\nOutput: {}",
        resolve_output_dir(None, &config).display()
    );

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
