//! Concrete implementations of the port traits.

pub mod chart_svg;
pub mod csv_adapter;
pub mod eastmoney_kline;
pub mod eastmoney_news;
pub mod fallback_market;
pub mod file_config_adapter;
pub mod http;
pub mod lexicon_model;
pub mod serverchan_notifier;
pub mod sina_kline;
pub mod sina_news;
pub mod text_report;
pub mod xueqiu_news;
