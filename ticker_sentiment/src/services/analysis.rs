use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{Result, SentimentError};
use crate::models::{
    ArticleSentiment, NewsArticle, SentimentLabel, SentimentResponse, VendorConsensusResponse,
};
use crate::services::collector::NewsCollectorService;
use crate::services::decision::{aggregate_with, round_score, ThresholdPolicy};
use crate::services::processor::{SentimentClassifier, TextNormalizer};

const MAX_TICKER_LEN: usize = 16;
const DISPLAY_DIGITS: i32 = 3;

/// Полный цикл запроса: новости -> очистка -> классификация -> агрегация
#[derive(Clone)]
pub struct SentimentAnalysisService {
    collector: NewsCollectorService,
    normalizer: Arc<TextNormalizer>,
    classifier: SentimentClassifier,
    max_concurrent: usize,
}

impl SentimentAnalysisService {
    pub fn new(
        collector: NewsCollectorService,
        classifier: SentimentClassifier,
        config: &AppConfig,
    ) -> Result<Self> {
        Ok(SentimentAnalysisService {
            collector,
            normalizer: Arc::new(TextNormalizer::new()?),
            classifier,
            max_concurrent: config.max_concurrent(),
        })
    }

    pub fn model_name(&self) -> &str {
        self.classifier.model_name()
    }

    pub async fn analyze(&self, ticker: &str) -> Result<SentimentResponse> {
        let ticker = normalize_ticker(ticker)?;
        let articles = self.collector.fetch_news(&ticker).await?;
        let sentiments = self.classify_articles(&articles).await?;

        let scores: Vec<f64> = sentiments.iter().map(|s| s.score).collect();
        let labels: Vec<SentimentLabel> = sentiments.iter().map(|s| s.label).collect();
        // Та же политика, что и у классификатора
        let result = aggregate_with(&self.classifier.policy(), &scores, &labels);

        tracing::info!(
            ticker = %ticker,
            articles = sentiments.len(),
            final_sentiment = result.final_label_name(),
            "Анализ настроений завершён"
        );

        Ok(SentimentResponse {
            ticker,
            final_sentiment: result.final_label_name().to_string(),
            average_sentiment_score: round_score(result.average_score(), DISPLAY_DIGITS),
            most_common_sentiment: result.most_common_label_name().to_string(),
        })
    }

    /// Сводка по оценкам, которые Alpha Vantage сама поставила тикеру
    pub async fn vendor_consensus(&self, ticker: &str) -> Result<VendorConsensusResponse> {
        let ticker = normalize_ticker(ticker)?;
        let articles = self.collector.fetch_news(&ticker).await?;

        let mut scores = Vec::new();
        let mut labels = Vec::new();
        for mention in articles
            .iter()
            .flat_map(|article| article.ticker_sentiment.iter())
            .filter(|mention| mention.ticker.eq_ignore_ascii_case(&ticker))
        {
            match mention.label.parse::<SentimentLabel>() {
                Ok(label) => {
                    scores.push(mention.score);
                    labels.push(label);
                }
                Err(e) => tracing::warn!("Пропущена оценка Alpha Vantage: {}", e),
            }
        }

        if scores.is_empty() {
            return Err(SentimentError::NoSentimentData(ticker));
        }

        let result = aggregate_with(&ThresholdPolicy::ALPHA_VANTAGE, &scores, &labels);
        tracing::info!(
            ticker = %ticker,
            mentions = scores.len(),
            final_sentiment = result.final_label_name(),
            "Сводка Alpha Vantage готова"
        );

        Ok(VendorConsensusResponse {
            ticker,
            final_sentiment: result.final_label_name().to_string(),
            average_sentiment_score: round_score(result.average_score(), DISPLAY_DIGITS),
            most_common_sentiment: result.most_common_label_name().to_string(),
            mentions_count: scores.len(),
        })
    }

    async fn classify_articles(&self, articles: &[NewsArticle]) -> Result<Vec<ArticleSentiment>> {
        let tasks: Vec<_> = articles
            .iter()
            .map(|article| {
                let text = self.normalizer.combine(&article.title, &article.summary);
                let classifier = self.classifier.clone();
                async move {
                    let (label, score) = classifier.classify(&text).await?;
                    tracing::debug!("Статья классифицирована: {} ({:.3})", label, score);
                    Ok::<ArticleSentiment, SentimentError>(ArticleSentiment { score, label })
                }
            })
            .collect();

        // buffered, а не buffer_unordered: порядок статей решает ничью в самой частой метке
        stream::iter(tasks)
            .buffered(self.max_concurrent)
            .try_collect()
            .await
    }
}

pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(SentimentError::InvalidTicker("тикер не указан".to_string()));
    }
    if ticker.len() > MAX_TICKER_LEN
        || !ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'))
    {
        return Err(SentimentError::InvalidTicker(ticker.to_string()));
    }
    Ok(ticker.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelBackend;
    use crate::services::model::LexiconModel;

    fn assert_send<T: Send>(_: &T) {}

    fn lexicon_service() -> SentimentAnalysisService {
        let config = AppConfig {
            bind_address: "127.0.0.1:0".to_string(),
            alpha_vantage_url: "http://127.0.0.1:9/query".to_string(),
            alpha_vantage_api_key: "test_key".to_string(),
            model_backend: ModelBackend::Lexicon,
            huggingface_api_url: String::new(),
            huggingface_api_key: String::new(),
            max_articles: None,
            max_concurrent_requests: Some(2),
            request_timeout_secs: Some(1),
            log_json: false,
            log_dir: None,
        };
        let collector = NewsCollectorService::new(&config).unwrap();
        let classifier = SentimentClassifier::new(Arc::new(LexiconModel::new()));
        SentimentAnalysisService::new(collector, classifier, &config).unwrap()
    }

    #[test]
    fn analysis_futures_can_be_served_by_axum() {
        // Обработчики axum требуют Send-future для всего цикла анализа
        let service = lexicon_service();
        assert_send(&service.analyze("AAPL"));
        assert_send(&service.vendor_consensus("AAPL"));

        let articles = vec![NewsArticle {
            title: "Shares surge".to_string(),
            summary: "Record profit.".to_string(),
            ticker_sentiment: Vec::new(),
        }];
        assert_send(&service.classify_articles(&articles));
    }

    #[tokio::test]
    async fn classify_articles_keeps_feed_order() {
        let service = lexicon_service();
        let titles = [
            "Shares surge on record profit",
            "Stock plunge on fraud lawsuit",
            "Annual meeting",
        ];
        let articles: Vec<NewsArticle> = titles
            .iter()
            .map(|title| NewsArticle {
                title: title.to_string(),
                summary: String::new(),
                ticker_sentiment: Vec::new(),
            })
            .collect();

        let labels: Vec<SentimentLabel> = service
            .classify_articles(&articles)
            .await
            .unwrap()
            .iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(
            labels,
            vec![SentimentLabel::Bullish, SentimentLabel::Bearish, SentimentLabel::Neutral]
        );
    }

    #[test]
    fn ticker_is_trimmed_and_uppercased() {
        assert_eq!(normalize_ticker(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_ticker("BRK.B").unwrap(), "BRK.B");
        assert_eq!(normalize_ticker("crypto:btc").unwrap(), "CRYPTO:BTC");
    }

    #[test]
    fn bad_tickers_are_rejected() {
        for raw in ["", "   ", "AAPL&apikey=x", "TOO-LONG-TICKER-SYMBOL", "A B"] {
            assert!(
                matches!(normalize_ticker(raw), Err(SentimentError::InvalidTicker(_))),
                "{:?}",
                raw
            );
        }
    }
}
