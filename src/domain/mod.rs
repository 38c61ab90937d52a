//! Core domain types and logic.

pub mod analysis;
pub mod candle;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod news;
pub mod scoring;
pub mod sentiment;
pub mod technical;
