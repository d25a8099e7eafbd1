// errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentimentError {
    #[error("Ошибка HTTP запроса: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Ошибка regex: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Некорректный тикер: {0}")]
    InvalidTicker(String),

    #[error("Ошибка получения новостей: {0}")]
    UpstreamUnavailable(String),

    #[error("Достигнут лимит запросов к API: {0}")]
    UpstreamRateLimited(String),

    #[error("API вернул ошибку: {0}")]
    UpstreamError(String),

    #[error("API вернул HTTP {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Не найдено новостей для тикера: {0}")]
    NoArticles(String),

    #[error("Ответ API не содержит ленты новостей")]
    NoFeedData,

    #[error("Нет данных о настроениях для тикера: {0}")]
    NoSentimentData(String),

    #[error("Модель классификации недоступна: {0}")]
    ModelUnavailable(String),

    #[error("Некорректный формат данных: {0}")]
    InvalidDataFormat(String),
}

impl SentimentError {
    /// Машиночитаемый тип ошибки для поля `error_type`
    pub fn error_type(&self) -> &'static str {
        match self {
            SentimentError::InvalidTicker(_) => "invalid_ticker",
            SentimentError::UpstreamUnavailable(_) => "upstream_unavailable",
            SentimentError::UpstreamRateLimited(_) => "upstream_rate_limited",
            SentimentError::UpstreamError(_) => "upstream_error",
            SentimentError::UpstreamStatus { .. } => "upstream_status",
            SentimentError::NoArticles(_) => "no_articles",
            SentimentError::NoFeedData => "no_feed_data",
            SentimentError::NoSentimentData(_) => "no_sentiment_data",
            SentimentError::ModelUnavailable(_) => "model_unavailable",
            SentimentError::HttpError(_) | SentimentError::InvalidDataFormat(_) => "bad_gateway",
            SentimentError::RegexError(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SentimentError::InvalidTicker(_) | SentimentError::UpstreamError(_) => {
                StatusCode::BAD_REQUEST
            }
            SentimentError::UpstreamUnavailable(_) | SentimentError::ModelUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SentimentError::UpstreamRateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            SentimentError::UpstreamStatus { status, .. } => StatusCode::from_u16(*status)
                .ok()
                .filter(|code| code.is_client_error() || code.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            SentimentError::NoArticles(_)
            | SentimentError::NoFeedData
            | SentimentError::NoSentimentData(_) => StatusCode::NOT_FOUND,
            SentimentError::HttpError(_) | SentimentError::InvalidDataFormat(_) => {
                StatusCode::BAD_GATEWAY
            }
            SentimentError::RegexError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SentimentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Ошибка обработки запроса: {}", self);
        } else {
            tracing::warn!("Запрос отклонён: {}", self);
        }

        let body = Json(json!({
            "status": "error",
            "error_type": self.error_type(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

// Определяем псевдоним Result с фиксированным типом ошибки
pub type Result<T> = std::result::Result<T, SentimentError>;
