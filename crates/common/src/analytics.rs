//! Sentiment and stakeholder aggregation
//!
//! Single-pass folds over `GROUP BY` rows returned by the repository.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::db::{models::TopComment, LabelCount};

/// Sentiment label stored with every comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }

    /// Normalize a free-text label (`POSITIVE`, `negative`, ...) to a
    /// sentiment. Labels outside the three known values yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let mut chars = label.chars();
        let first = chars.next()?;
        let candidate: String = first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect();

        match candidate.as_str() {
            "Positive" => Some(Sentiment::Positive),
            "Negative" => Some(Sentiment::Negative),
            "Neutral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comment counts per sentiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SentimentDistribution {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

/// Share of each sentiment, in percent with one decimal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SentimentPercentages {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl SentimentDistribution {
    /// Fold `GROUP BY sentiment` rows. Unrecognized labels are dropped.
    pub fn from_counts(rows: &[LabelCount]) -> Self {
        let mut dist = Self::default();
        dist.absorb(rows);
        dist
    }

    /// Add another set of `GROUP BY sentiment` rows to this distribution
    pub fn absorb(&mut self, rows: &[LabelCount]) {
        for row in rows {
            match row.label.as_deref().and_then(Sentiment::from_label) {
                Some(Sentiment::Positive) => self.positive += row.count,
                Some(Sentiment::Negative) => self.negative += row.count,
                Some(Sentiment::Neutral) => self.neutral += row.count,
                None => {}
            }
        }
    }

    pub fn total(&self) -> i64 {
        self.positive + self.negative + self.neutral
    }

    pub fn count(&self, sentiment: Sentiment) -> i64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    /// Percentage of `sentiment`, one decimal; 0 when there are no comments
    pub fn percentage(&self, sentiment: Sentiment) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        round_one_decimal(self.count(sentiment) as f64 / total as f64 * 100.0)
    }

    pub fn percentages(&self) -> SentimentPercentages {
        SentimentPercentages {
            positive: self.percentage(Sentiment::Positive),
            negative: self.percentage(Sentiment::Negative),
            neutral: self.percentage(Sentiment::Neutral),
        }
    }

    /// Positive vs negative lean used by the executive summary. Neutral
    /// comments do not take part; a tie reads as neutral.
    pub fn leaning(&self) -> Sentiment {
        if self.positive > self.negative {
            Sentiment::Positive
        } else if self.negative > self.positive {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// The label strictly larger than both others, otherwise neutral
    pub fn dominant(&self) -> Sentiment {
        if self.positive > self.negative && self.positive > self.neutral {
            Sentiment::Positive
        } else if self.negative > self.positive && self.negative > self.neutral {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fold `GROUP BY stakeholder_type` rows into a breakdown map.
/// A missing stakeholder type is reported as `Unknown`.
pub fn stakeholder_breakdown<'a>(
    rows: impl IntoIterator<Item = &'a LabelCount>,
) -> BTreeMap<String, i64> {
    let mut breakdown = BTreeMap::new();
    for row in rows {
        let key = row
            .label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        *breakdown.entry(key).or_insert(0) += row.count;
    }
    breakdown
}

/// One-paragraph summary shown at the top of the Minister dashboard
pub fn executive_summary(
    active_consultations: usize,
    total_submissions: i64,
    distribution: &SentimentDistribution,
) -> String {
    let leaning = distribution.leaning();
    let share = if distribution.total() > 0 {
        format!("{:.1}", distribution.percentage(leaning))
    } else {
        "0".to_string()
    };

    format!(
        "Currently {} active consultation{} with {} total submissions. \
         Overall sentiment is predominantly {} ({}%) with engagement from multiple stakeholder groups.",
        active_consultations,
        if active_consultations == 1 { "" } else { "s" },
        total_submissions,
        leaning.as_str().to_lowercase(),
        share,
    )
}

/// Merge per-bill top comment lists into one ranking: highest confidence
/// first, newer first on ties
pub fn rank_top_comments(per_bill: Vec<Vec<TopComment>>, limit: usize) -> Vec<TopComment> {
    let mut merged: Vec<TopComment> = per_bill.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        let score = |c: &TopComment| c.confidence_score.unwrap_or(0.0);
        score(b)
            .total_cmp(&score(a))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    merged.truncate(limit);
    merged
}
