//! Combined sentiment + technical score and the five-tier recommendation.
//!
//! All weights, point deltas and tier bounds live in [`ScoringConfig`]; `score`
//! is a pure function of its inputs.

use std::fmt;

use crate::domain::sentiment::{SentimentLabel, SentimentThresholds, NEUTRAL_POLARITY};
use crate::domain::technical::TechnicalSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub sentiment_weight: f64,
    pub technical_weight: f64,
    pub thresholds: SentimentThresholds,

    /// Base of each label's sentiment band, before the average adjustment.
    pub positive_base: f64,
    pub neutral_base: f64,
    pub negative_base: f64,
    /// Points per unit of (average - 0.5).
    pub sentiment_spread: f64,

    pub technical_base: f64,
    pub macd_delta: f64,
    pub kdj_delta: f64,
    pub alignment_delta: f64,
    pub volume_delta: f64,
    pub momentum_delta: f64,
    /// Daily % change beyond which the momentum delta applies.
    pub momentum_pct: f64,

    pub strong_buy: f64,
    pub buy: f64,
    pub hold: f64,
    pub watch: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            sentiment_weight: 0.4,
            technical_weight: 0.6,
            thresholds: SentimentThresholds::default(),
            positive_base: 80.0,
            neutral_base: 40.0,
            negative_base: 20.0,
            sentiment_spread: 40.0,
            technical_base: 50.0,
            macd_delta: 10.0,
            kdj_delta: 15.0,
            alignment_delta: 10.0,
            volume_delta: 5.0,
            momentum_delta: 5.0,
            momentum_pct: 3.0,
            strong_buy: 80.0,
            buy: 65.0,
            hold: 45.0,
            watch: 30.0,
        }
    }
}

impl ScoringConfig {
    fn sentiment_base(&self, label: SentimentLabel) -> f64 {
        match label {
            SentimentLabel::Positive => self.positive_base,
            SentimentLabel::Neutral => self.neutral_base,
            SentimentLabel::Negative => self.negative_base,
        }
    }

    /// Allowed range of the sentiment sub-score for `label`.
    ///
    /// Each band spans half the spread above its own base. Positive and
    /// Neutral never drop below their base; Negative also reaches half the
    /// spread below it. Bounds are kept inside [0, 100].
    pub fn sentiment_band(&self, label: SentimentLabel) -> (f64, f64) {
        let base = self.sentiment_base(label);
        let half = self.sentiment_spread.abs() / 2.0;
        let lo = match label {
            SentimentLabel::Negative => base - half,
            SentimentLabel::Positive | SentimentLabel::Neutral => base,
        };
        (lo.clamp(0.0, 100.0), (base + half).clamp(0.0, 100.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Watch,
    Sell,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "强烈买入",
            Recommendation::Buy => "买入",
            Recommendation::Hold => "持有",
            Recommendation::Watch => "观望",
            Recommendation::Sell => "卖出",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
    MediumHigh,
    Medium,
    MediumLow,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "高",
            Confidence::MediumHigh => "中高",
            Confidence::Medium => "中",
            Confidence::MediumLow => "中低",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "低",
            RiskLevel::Medium => "中",
            RiskLevel::High => "高",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub sentiment_score: f64,
    pub technical_score: f64,
    pub final_score: f64,
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
}

pub fn sentiment_score(label: SentimentLabel, average: f64, config: &ScoringConfig) -> f64 {
    let base = config.sentiment_base(label);
    let (lo, hi) = config.sentiment_band(label);
    (base + (average - NEUTRAL_POLARITY) * config.sentiment_spread).clamp(lo, hi)
}

pub fn technical_score(snapshot: &TechnicalSnapshot, config: &ScoringConfig) -> f64 {
    let mut score = config.technical_base;

    if snapshot.macd_bullish() {
        score += config.macd_delta;
    } else {
        score -= config.macd_delta;
    }

    if snapshot.oversold {
        score += config.kdj_delta;
    } else if snapshot.overbought {
        score -= config.kdj_delta;
    }

    if snapshot.bullish_alignment() {
        score += config.alignment_delta;
    } else if snapshot.bearish_alignment() {
        score -= config.alignment_delta;
    }

    if snapshot.volume_high {
        score += config.volume_delta;
    }

    if snapshot.pct_change > config.momentum_pct {
        score += config.momentum_delta;
    } else if snapshot.pct_change < -config.momentum_pct {
        score -= config.momentum_delta;
    }

    score.clamp(0.0, 100.0)
}

/// Map a final score to its tier. Lower bounds are inclusive.
pub fn advise(final_score: f64, config: &ScoringConfig) -> (Recommendation, Confidence, RiskLevel) {
    if final_score >= config.strong_buy {
        (Recommendation::StrongBuy, Confidence::High, RiskLevel::Low)
    } else if final_score >= config.buy {
        (Recommendation::Buy, Confidence::MediumHigh, RiskLevel::Low)
    } else if final_score >= config.hold {
        (Recommendation::Hold, Confidence::Medium, RiskLevel::Medium)
    } else if final_score >= config.watch {
        (Recommendation::Watch, Confidence::MediumLow, RiskLevel::Medium)
    } else {
        (Recommendation::Sell, Confidence::High, RiskLevel::High)
    }
}

pub fn score(
    label: SentimentLabel,
    average: f64,
    snapshot: &TechnicalSnapshot,
    config: &ScoringConfig,
) -> ScoreResult {
    let sentiment = sentiment_score(label, average, config);
    let technical = technical_score(snapshot, config);
    let final_score = sentiment * config.sentiment_weight + technical * config.technical_weight;
    let (recommendation, confidence, risk_level) = advise(final_score, config);

    ScoreResult {
        sentiment_score: sentiment,
        technical_score: technical,
        final_score,
        recommendation,
        confidence,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    /// diff == dea, no KDJ extreme, no alignment, no volume, flat day.
    /// MACD still costs 10 points since diff > dea is false.
    fn flat_snapshot() -> TechnicalSnapshot {
        TechnicalSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
            close: 10.0,
            pct_change: 0.0,
            volume: 1000,
            ma5: 10.0,
            ma10: 10.0,
            ma20: 10.0,
            ema12: 10.0,
            ema26: 10.0,
            diff: 0.0,
            dea: 0.0,
            macd_hist: 0.0,
            k: 50.0,
            d: 50.0,
            j: 50.0,
            volume_high: false,
            oversold: false,
            overbought: false,
        }
    }

    #[test]
    fn oversold_uptrend_with_no_news_is_buy() {
        let snap = TechnicalSnapshot {
            close: 12.0,
            ma5: 11.5,
            ma10: 11.0,
            ma20: 10.5,
            diff: 0.3,
            dea: 0.1,
            k: 15.0,
            d: 10.0,
            oversold: true,
            volume_high: true,
            pct_change: 4.0,
            ..flat_snapshot()
        };
        let result = score(SentimentLabel::Neutral, 0.5, &snap, &ScoringConfig::default());

        assert_abs_diff_eq!(result.technical_score, 95.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.sentiment_score, 40.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.final_score, 73.0, epsilon = 1e-9);
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert_eq!(result.confidence, Confidence::MediumHigh);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn all_positive_news_with_neutral_technicals_is_buy() {
        let snap = TechnicalSnapshot {
            diff: 0.2,
            dea: 0.1,
            pct_change: -3.0,
            ..flat_snapshot()
        };
        // MACD always moves the score by ten, so zero it to isolate the 50 base.
        let config = ScoringConfig {
            macd_delta: 0.0,
            ..ScoringConfig::default()
        };
        let result = score(SentimentLabel::Positive, 0.9, &snap, &config);

        assert_abs_diff_eq!(result.sentiment_score, 96.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.technical_score, 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.final_score, 68.4, epsilon = 1e-9);
        assert_eq!(result.recommendation, Recommendation::Buy);
        assert_eq!(result.confidence, Confidence::MediumHigh);
    }

    #[test]
    fn technical_score_deltas() {
        let config = ScoringConfig::default();
        assert_eq!(technical_score(&flat_snapshot(), &config), 40.0);

        let bearish = TechnicalSnapshot {
            close: 9.0,
            ma5: 9.5,
            ma10: 10.0,
            ma20: 10.5,
            overbought: true,
            pct_change: -5.0,
            ..flat_snapshot()
        };
        // 50 - 10 - 15 - 10 - 5
        assert_eq!(technical_score(&bearish, &config), 10.0);
    }

    #[test]
    fn technical_score_is_clamped() {
        let config = ScoringConfig {
            technical_base: 95.0,
            ..ScoringConfig::default()
        };
        let snap = TechnicalSnapshot {
            diff: 1.0,
            volume_high: true,
            ..flat_snapshot()
        };
        assert_eq!(technical_score(&snap, &config), 100.0);

        let config = ScoringConfig {
            technical_base: 5.0,
            ..ScoringConfig::default()
        };
        assert_eq!(technical_score(&flat_snapshot(), &config), 0.0);
    }

    #[test]
    fn sentiment_score_stays_in_band() {
        let config = ScoringConfig::default();
        assert_eq!(sentiment_score(SentimentLabel::Positive, 0.2, &config), 80.0);
        assert_eq!(sentiment_score(SentimentLabel::Positive, 1.0, &config), 100.0);
        assert_eq!(sentiment_score(SentimentLabel::Negative, 1.0, &config), 40.0);
        assert_eq!(sentiment_score(SentimentLabel::Negative, 0.0, &config), 0.0);
        assert_eq!(sentiment_score(SentimentLabel::Neutral, 0.0, &config), 40.0);
        assert_eq!(sentiment_score(SentimentLabel::Neutral, 1.0, &config), 60.0);
        assert_abs_diff_eq!(
            sentiment_score(SentimentLabel::Negative, 0.2, &config),
            8.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn default_bands() {
        let config = ScoringConfig::default();
        assert_eq!(config.sentiment_band(SentimentLabel::Positive), (80.0, 100.0));
        assert_eq!(config.sentiment_band(SentimentLabel::Neutral), (40.0, 60.0));
        assert_eq!(config.sentiment_band(SentimentLabel::Negative), (0.0, 40.0));
    }

    #[test]
    fn each_band_follows_its_own_base() {
        let config = ScoringConfig {
            neutral_base: 50.0,
            ..ScoringConfig::default()
        };
        assert_eq!(config.sentiment_band(SentimentLabel::Neutral), (50.0, 70.0));
        assert_eq!(config.sentiment_band(SentimentLabel::Negative), (0.0, 40.0));
        assert_eq!(sentiment_score(SentimentLabel::Negative, 1.0, &config), 40.0);

        let narrow = ScoringConfig {
            sentiment_spread: 20.0,
            ..ScoringConfig::default()
        };
        assert_eq!(narrow.sentiment_band(SentimentLabel::Positive), (80.0, 90.0));
        assert_eq!(narrow.sentiment_band(SentimentLabel::Negative), (10.0, 30.0));
    }

    #[test]
    fn tier_lower_bounds_are_inclusive() {
        let config = ScoringConfig::default();
        assert_eq!(advise(80.0, &config).0, Recommendation::StrongBuy);
        assert_eq!(advise(79.999, &config).0, Recommendation::Buy);
        assert_eq!(advise(65.0, &config).0, Recommendation::Buy);
        assert_eq!(advise(45.0, &config).0, Recommendation::Hold);
        assert_eq!(advise(30.0, &config).0, Recommendation::Watch);
        assert_eq!(advise(29.999, &config).0, Recommendation::Sell);
    }

    #[test]
    fn tiers_carry_confidence_and_risk() {
        let config = ScoringConfig::default();
        assert_eq!(
            advise(90.0, &config),
            (Recommendation::StrongBuy, Confidence::High, RiskLevel::Low)
        );
        assert_eq!(
            advise(50.0, &config),
            (Recommendation::Hold, Confidence::Medium, RiskLevel::Medium)
        );
        assert_eq!(
            advise(35.0, &config),
            (Recommendation::Watch, Confidence::MediumLow, RiskLevel::Medium)
        );
        assert_eq!(
            advise(10.0, &config),
            (Recommendation::Sell, Confidence::High, RiskLevel::High)
        );
    }

    #[test]
    fn display_strings() {
        assert_eq!(Recommendation::StrongBuy.to_string(), "强烈买入");
        assert_eq!(Confidence::MediumLow.to_string(), "中低");
        assert_eq!(RiskLevel::High.to_string(), "高");
    }

    fn label_strategy() -> impl Strategy<Value = SentimentLabel> {
        prop_oneof![
            Just(SentimentLabel::Positive),
            Just(SentimentLabel::Neutral),
            Just(SentimentLabel::Negative),
        ]
    }

    proptest! {
        #[test]
        fn scoring_is_idempotent_and_bounded(
            label in label_strategy(),
            average in 0.0f64..=1.0,
            k in 0.0f64..100.0,
            d in 0.0f64..100.0,
            diff in -2.0f64..2.0,
            pct in -10.0f64..10.0,
            volume_high in any::<bool>(),
        ) {
            let snap = TechnicalSnapshot {
                k,
                d,
                diff,
                pct_change: pct,
                volume_high,
                oversold: k < 20.0 && d < 20.0,
                overbought: k > 80.0 && d > 80.0,
                ..flat_snapshot()
            };
            let config = ScoringConfig::default();
            let a = score(label, average, &snap, &config);
            let b = score(label, average, &snap, &config);
            prop_assert_eq!(&a, &b);
            prop_assert!((0.0..=100.0).contains(&a.final_score));
            prop_assert!((0.0..=100.0).contains(&a.technical_score));
            let (lo, hi) = config.sentiment_band(label);
            prop_assert!(a.sentiment_score >= lo && a.sentiment_score <= hi);
        }
    }
}
