use reqwest::{Client, ClientBuilder};
use serde_json::Value;

use crate::config::AppConfig;
use crate::errors::{Result, SentimentError};
use crate::models::{NewsArticle, VendorTickerSentiment, NO_SUMMARY, NO_TITLE};

/// Клиент Alpha Vantage NEWS_SENTIMENT
#[derive(Clone)]
pub struct NewsCollectorService {
    client: Client,
    api_url: String,
    api_key: String,
    max_articles: Option<usize>,
}

impl NewsCollectorService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout())
            .build()?;
        Ok(NewsCollectorService {
            client,
            api_url: config.alpha_vantage_url.clone(),
            api_key: config.alpha_vantage_api_key.clone(),
            max_articles: config.max_articles,
        })
    }

    pub async fn fetch_news(&self, ticker: &str) -> Result<Vec<NewsArticle>> {
        let payload = self.fetch_payload(ticker).await?;
        let articles = parse_feed(ticker, &payload, self.max_articles)?;
        tracing::info!("Получено {} статей для {}", articles.len(), ticker);
        Ok(articles)
    }

    async fn fetch_payload(&self, ticker: &str) -> Result<Value> {
        let url = format!(
            "{}?function=NEWS_SENTIMENT&tickers={}&apikey={}",
            self.api_url,
            urlencoding::encode(ticker),
            urlencoding::encode(&self.api_key)
        );

        // URL не логируем: в нём ключ API
        tracing::info!("Запрос новостей Alpha Vantage для {}", ticker);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SentimentError::UpstreamUnavailable(e.without_url().to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Неизвестная ошибка".to_string());
            return Err(SentimentError::UpstreamStatus {
                status: status.as_u16(),
                message: error_text,
            });
        }

        // Таймаут при чтении тела тоже означает недоступность источника
        let json: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SentimentError::UpstreamUnavailable(e.without_url().to_string())
            } else {
                SentimentError::InvalidDataFormat(e.without_url().to_string())
            }
        })?;
        Ok(json)
    }
}

/// Проверяет признаки ошибок в ответе и достаёт статьи из `feed`
pub fn parse_feed(
    ticker: &str,
    payload: &Value,
    max_articles: Option<usize>,
) -> Result<Vec<NewsArticle>> {
    // Alpha Vantage сообщает о лимите через Note (старый формат) или Information
    if let Some(note) = payload.get("Note").or_else(|| payload.get("Information")) {
        return Err(SentimentError::UpstreamRateLimited(value_text(note)));
    }
    if let Some(message) = payload.get("Error Message") {
        return Err(SentimentError::UpstreamError(value_text(message)));
    }

    let entries = payload
        .get("feed")
        .and_then(Value::as_array)
        .ok_or(SentimentError::NoFeedData)?;

    if entries.is_empty() {
        return Err(SentimentError::NoArticles(ticker.to_string()));
    }

    let limit = max_articles.unwrap_or(entries.len());
    Ok(entries.iter().take(limit).map(parse_article).collect())
}

fn parse_article(entry: &Value) -> NewsArticle {
    let title = entry["title"].as_str().unwrap_or(NO_TITLE).to_string();
    let summary = entry["summary"].as_str().unwrap_or(NO_SUMMARY).to_string();
    let ticker_sentiment = entry["ticker_sentiment"]
        .as_array()
        .map(|items| items.iter().filter_map(parse_ticker_sentiment).collect())
        .unwrap_or_default();

    NewsArticle {
        title,
        summary,
        ticker_sentiment,
    }
}

fn parse_ticker_sentiment(item: &Value) -> Option<VendorTickerSentiment> {
    let ticker = item["ticker"].as_str()?;
    let score = number_field(&item["ticker_sentiment_score"])?;
    let label = item["ticker_sentiment_label"].as_str()?;

    Some(VendorTickerSentiment {
        ticker: ticker.to_string(),
        relevance_score: number_field(&item["relevance_score"]),
        score,
        label: label.to_string(),
    })
}

// Alpha Vantage отдаёт числа строками
fn number_field(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn value_text(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rate_limit_note_is_reported_distinctly() {
        let payload = json!({"Note": "Thank you for using Alpha Vantage! 5 calls per minute."});
        match parse_feed("AAPL", &payload, None) {
            Err(SentimentError::UpstreamRateLimited(message)) => {
                assert!(message.contains("5 calls"))
            }
            other => panic!("ожидался лимит, получено {:?}", other),
        }

        let information =
            json!({"Information": "Our standard API rate limit is 25 requests per day."});
        assert!(matches!(
            parse_feed("AAPL", &information, None),
            Err(SentimentError::UpstreamRateLimited(_))
        ));
    }

    #[test]
    fn error_message_is_passed_through() {
        let payload = json!({"Error Message": "Invalid API call."});
        match parse_feed("???", &payload, None) {
            Err(SentimentError::UpstreamError(message)) => {
                assert_eq!(message, "Invalid API call.")
            }
            other => panic!("ожидалась ошибка API, получено {:?}", other),
        }
    }

    #[test]
    fn missing_or_malformed_feed_is_no_feed_data() {
        assert!(matches!(
            parse_feed("AAPL", &json!({"items": "0"}), None),
            Err(SentimentError::NoFeedData)
        ));
        assert!(matches!(
            parse_feed("AAPL", &json!({"feed": "nothing"}), None),
            Err(SentimentError::NoFeedData)
        ));
    }

    #[test]
    fn empty_feed_is_no_articles() {
        match parse_feed("ZZZZ", &json!({"feed": []}), None) {
            Err(SentimentError::NoArticles(ticker)) => assert_eq!(ticker, "ZZZZ"),
            other => panic!("ожидалось отсутствие статей, получено {:?}", other),
        }
    }

    #[test]
    fn articles_get_placeholders_and_vendor_scores() {
        let payload = json!({
            "items": "2",
            "feed": [
                {
                    "title": "Apple beats estimates",
                    "summary": "Strong iPhone sales.",
                    "ticker_sentiment": [
                        {
                            "ticker": "AAPL",
                            "relevance_score": "0.91",
                            "ticker_sentiment_score": "0.412",
                            "ticker_sentiment_label": "Bullish"
                        },
                        {"ticker": "MSFT", "ticker_sentiment_label": "Neutral"}
                    ]
                },
                {"summary": null}
            ]
        });

        let articles = parse_feed("AAPL", &payload, None).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Apple beats estimates");
        assert_eq!(articles[0].ticker_sentiment.len(), 1);
        assert_eq!(articles[0].ticker_sentiment[0].score, 0.412);
        assert_eq!(articles[0].ticker_sentiment[0].relevance_score, Some(0.91));
        assert_eq!(articles[1].title, NO_TITLE);
        assert_eq!(articles[1].summary, NO_SUMMARY);
        assert!(articles[1].ticker_sentiment.is_empty());
    }

    #[test]
    fn max_articles_keeps_feed_order() {
        let payload = json!({"feed": [
            {"title": "first", "summary": "a"},
            {"title": "second", "summary": "b"},
            {"title": "third", "summary": "c"}
        ]});
        let articles = parse_feed("AAPL", &payload, Some(2)).unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
