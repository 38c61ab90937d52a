//! Port traits at every I/O seam.

pub mod config_port;
pub mod market_port;
pub mod news_port;
pub mod notify_port;
pub mod report_port;
pub mod sentiment_port;
