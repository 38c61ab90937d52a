//! stockeval: news-sentiment and technical-indicator evaluation for A-share stocks.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line orchestration in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
