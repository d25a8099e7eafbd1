use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::errors::{Result, SentimentError};
use crate::models::{SentimentResponse, VendorConsensusResponse};
use crate::AppState;

const UI_PAGE: &str = include_str!("ui.html");

#[derive(Deserialize)]
pub struct SentimentQuery {
    pub ticker: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub model: String,
    pub started_at: String,
    pub available_endpoints: Vec<String>,
}

// Приветствие на корневом маршруте
pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Financial Sentiment Analysis API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// Получение статуса сервиса
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ready".to_string(),
        model: state.analysis.model_name().to_string(),
        started_at: state.started_at.to_rfc3339(),
        available_endpoints: vec![
            "/".to_string(),
            "/status".to_string(),
            "/ui".to_string(),
            "/sentiment?ticker=".to_string(),
            "/api/v1/sentiment?ticker=".to_string(),
            "/api/v1/sentiment/vendor?ticker=".to_string(),
        ],
    })
}

// Основной обработчик: настроение новостей по тикеру
pub async fn get_sentiment(
    State(state): State<AppState>,
    Query(query): Query<SentimentQuery>,
) -> Result<Json<SentimentResponse>> {
    let ticker = required_ticker(query)?;
    tracing::info!("Запрос анализа настроений для {}", ticker);
    let response = state.analysis.analyze(&ticker).await?;
    Ok(Json(response))
}

// Сводка по собственным оценкам Alpha Vantage
pub async fn get_vendor_sentiment(
    State(state): State<AppState>,
    Query(query): Query<SentimentQuery>,
) -> Result<Json<VendorConsensusResponse>> {
    let ticker = required_ticker(query)?;
    tracing::info!("Запрос сводки Alpha Vantage для {}", ticker);
    let response = state.analysis.vendor_consensus(&ticker).await?;
    Ok(Json(response))
}

pub async fn ui() -> Html<&'static str> {
    Html(UI_PAGE)
}

fn required_ticker(query: SentimentQuery) -> Result<String> {
    query
        .ticker
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| SentimentError::InvalidTicker("параметр ticker обязателен".to_string()))
}

// Создание маршрутов
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/status", get(get_status))
        .route("/ui", get(ui))
        .route("/sentiment", get(get_sentiment))
        .route("/api/v1/sentiment", get(get_sentiment))
        .route("/api/v1/sentiment/vendor", get(get_vendor_sentiment))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
