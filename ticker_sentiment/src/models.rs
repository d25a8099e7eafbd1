use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::SentimentError;

pub const NO_SENTIMENT_DATA: &str = "No Sentiment Data";
pub const NO_DATA: &str = "No Data";
pub const NO_TITLE: &str = "No title available";
pub const NO_SUMMARY: &str = "No summary available";

/// Пять категорий настроения, от самой негативной к самой позитивной
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Bearish,
    #[serde(rename = "Somewhat-Bearish")]
    SomewhatBearish,
    Neutral,
    #[serde(rename = "Somewhat-Bullish")]
    SomewhatBullish,
    Bullish,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 5] = [
        SentimentLabel::Bearish,
        SentimentLabel::SomewhatBearish,
        SentimentLabel::Neutral,
        SentimentLabel::SomewhatBullish,
        SentimentLabel::Bullish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Bearish => "Bearish",
            SentimentLabel::SomewhatBearish => "Somewhat-Bearish",
            SentimentLabel::Neutral => "Neutral",
            SentimentLabel::SomewhatBullish => "Somewhat-Bullish",
            SentimentLabel::Bullish => "Bullish",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = SentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "bearish" => Ok(SentimentLabel::Bearish),
            "somewhat-bearish" => Ok(SentimentLabel::SomewhatBearish),
            "neutral" => Ok(SentimentLabel::Neutral),
            "somewhat-bullish" => Ok(SentimentLabel::SomewhatBullish),
            "bullish" => Ok(SentimentLabel::Bullish),
            _ => Err(SentimentError::InvalidDataFormat(format!(
                "Неизвестная метка настроения: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArticleSentiment {
    pub score: f64, // positive - negative, -1.0 to 1.0
    pub label: SentimentLabel,
}

/// Итог агрегации по тикеру. `NoData` отличим от настоящего нейтрального результата.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateResult {
    NoData,
    Computed {
        final_label: SentimentLabel,
        average_score: f64,
        most_common_label: SentimentLabel,
    },
}

impl AggregateResult {
    pub fn is_no_data(&self) -> bool {
        matches!(self, AggregateResult::NoData)
    }

    pub fn final_label(&self) -> Option<SentimentLabel> {
        match self {
            AggregateResult::NoData => None,
            AggregateResult::Computed { final_label, .. } => Some(*final_label),
        }
    }

    pub fn most_common_label(&self) -> Option<SentimentLabel> {
        match self {
            AggregateResult::NoData => None,
            AggregateResult::Computed { most_common_label, .. } => Some(*most_common_label),
        }
    }

    pub fn average_score(&self) -> f64 {
        match self {
            AggregateResult::NoData => 0.0,
            AggregateResult::Computed { average_score, .. } => *average_score,
        }
    }

    pub fn final_label_name(&self) -> &'static str {
        self.final_label()
            .map_or(NO_SENTIMENT_DATA, |label| label.as_str())
    }

    pub fn most_common_label_name(&self) -> &'static str {
        self.most_common_label().map_or(NO_DATA, |label| label.as_str())
    }

    /// (final_label, average_score, most_common_label) в текстовом виде
    pub fn as_triple(&self) -> (&'static str, f64, &'static str) {
        (
            self.final_label_name(),
            self.average_score(),
            self.most_common_label_name(),
        )
    }
}

/// Оценка тикера, которую Alpha Vantage сама прикладывает к статье
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorTickerSentiment {
    pub ticker: String,
    pub relevance_score: Option<f64>,
    pub score: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub summary: String,
    pub ticker_sentiment: Vec<VendorTickerSentiment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResponse {
    pub ticker: String,
    pub final_sentiment: String,
    pub average_sentiment_score: f64,
    pub most_common_sentiment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorConsensusResponse {
    pub ticker: String,
    pub final_sentiment: String,
    pub average_sentiment_score: f64,
    pub most_common_sentiment: String,
    pub mentions_count: usize,
}
