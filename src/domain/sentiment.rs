//! Headline polarity tiers and aggregate sentiment label.

use std::fmt;

use crate::domain::news::NewsItem;
use crate::ports::sentiment_port::SentimentModel;

/// Average polarity reported for an empty headline list.
pub const NEUTRAL_POLARITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentThresholds {
    /// Scores strictly above this are positive.
    pub positive: f64,
    /// Scores strictly below this are negative.
    pub negative: f64,
    /// One side must outnumber the other by more than this factor to win the label.
    pub label_ratio: f64,
}

impl Default for SentimentThresholds {
    fn default() -> Self {
        Self {
            positive: 0.7,
            negative: 0.3,
            label_ratio: 1.5,
        }
    }
}

/// Per-headline tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Neutral,
    Negative,
}

impl Polarity {
    pub fn from_score(score: f64, thresholds: &SentimentThresholds) -> Self {
        if score > thresholds.positive {
            Polarity::Positive
        } else if score < thresholds.negative {
            Polarity::Negative
        } else {
            Polarity::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "正面",
            Polarity::Neutral => "中性",
            Polarity::Negative => "负面",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate label over all headlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Label from tier counts alone.
    pub fn from_counts(positive: usize, negative: usize, ratio: f64) -> Self {
        let (pos, neg) = (positive as f64, negative as f64);
        if pos > neg * ratio {
            SentimentLabel::Positive
        } else if neg > pos * ratio {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "正面",
            SentimentLabel::Neutral => "中性",
            SentimentLabel::Negative => "负面",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHeadline {
    pub item: NewsItem,
    pub score: f64,
    pub polarity: Polarity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentSummary {
    pub label: SentimentLabel,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub average: f64,
    pub scored: Vec<ScoredHeadline>,
}

impl SentimentSummary {
    pub fn empty() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            positive: 0,
            neutral: 0,
            negative: 0,
            average: NEUTRAL_POLARITY,
            scored: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// Aggregate raw polarity scores. Never fails; an empty slice is neutral.
pub fn summarize_scores(scores: &[f64], thresholds: &SentimentThresholds) -> SentimentSummary {
    let mut summary = SentimentSummary::empty();
    if scores.is_empty() {
        return summary;
    }
    for &score in scores {
        match Polarity::from_score(score, thresholds) {
            Polarity::Positive => summary.positive += 1,
            Polarity::Neutral => summary.neutral += 1,
            Polarity::Negative => summary.negative += 1,
        }
    }
    summary.average = scores.iter().sum::<f64>() / scores.len() as f64;
    summary.label =
        SentimentLabel::from_counts(summary.positive, summary.negative, thresholds.label_ratio);
    summary
}

/// Score every headline with `model` and aggregate.
pub fn summarize(
    items: &[NewsItem],
    model: &dyn SentimentModel,
    thresholds: &SentimentThresholds,
) -> SentimentSummary {
    let scores: Vec<f64> = items
        .iter()
        .map(|item| sanitize(model.polarity(&item.title)))
        .collect();

    let mut summary = summarize_scores(&scores, thresholds);
    summary.scored = items
        .iter()
        .zip(&scores)
        .map(|(item, &score)| ScoredHeadline {
            item: item.clone(),
            score,
            polarity: Polarity::from_score(score, thresholds),
        })
        .collect();
    summary
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        NEUTRAL_POLARITY
    }
}
