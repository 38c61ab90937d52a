//! Headline polarity model port.

/// Scores a single headline.
///
/// Implementations return a probability-like value in `[0, 1]`, where values
/// near 1 are positive and values near 0 are negative. Out-of-range values are
/// clamped by the caller.
pub trait SentimentModel {
    fn polarity(&self, text: &str) -> f64;
}
