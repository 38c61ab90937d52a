//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values

pub mod ema;
pub mod kdj;
pub mod macd;
pub mod sma;

pub use ema::calculate_ema;
pub use kdj::calculate_kdj;
pub use macd::calculate_macd;
pub use sma::calculate_sma;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd { diff: f64, dea: f64, histogram: f64 },
    Kdj { k: f64, d: f64, j: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Kdj(usize),
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    /// Most recent point, if it is past warmup.
    pub fn latest_valid(&self) -> Option<&IndicatorValue> {
        self.values.last().filter(|p| p.valid).map(|p| &p.value)
    }

    /// Most recent simple value, if valid.
    pub fn latest_simple(&self) -> Option<f64> {
        match self.latest_valid() {
            Some(IndicatorValue::Simple(v)) => Some(*v),
            _ => None,
        }
    }

    /// Simple values with `None` for warmup points.
    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|p| match p.value {
                IndicatorValue::Simple(v) if p.valid => Some(v),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "MA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Kdj(period) => write!(f, "KDJ({})", period),
        }
    }
}
