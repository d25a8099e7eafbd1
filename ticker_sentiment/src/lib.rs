use chrono::{DateTime, Utc};

pub mod config;
pub mod errors;
pub mod models;
pub mod routers;
pub mod services;

pub use crate::config::{load_config, AppConfig, ModelBackend};
pub use crate::errors::{Result, SentimentError};
pub use crate::models::{
    AggregateResult, ArticleSentiment, NewsArticle, SentimentLabel, SentimentResponse,
    VendorConsensusResponse, VendorTickerSentiment,
};
pub use crate::services::{
    aggregate, aggregate_articles, aggregate_with, build_model, threshold_label,
    ClassProbabilities, HuggingFaceModel, LexiconModel, NewsCollectorService,
    SentimentAnalysisService, SentimentClassifier, SentimentModel, TextNormalizer,
    ThresholdPolicy,
};

/// Состояние процесса: создаётся один раз в main и только читается
#[derive(Clone)]
pub struct AppState {
    pub analysis: SentimentAnalysisService,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(analysis: SentimentAnalysisService) -> Self {
        AppState {
            analysis,
            started_at: Utc::now(),
        }
    }
}
