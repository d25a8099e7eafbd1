use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, ModelBackend};
use crate::errors::{Result, SentimentError};

// FinBERT обрезает вход до 512 токенов, режем заранее по словам
const MAX_INPUT_CHARS: usize = 512;

/// Распределение вероятностей трёх классов (negative, neutral, positive)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassProbabilities {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl ClassProbabilities {
    /// Непрерывная оценка в диапазоне [-1, 1]
    pub fn score(&self) -> f64 {
        self.positive - self.negative
    }
}

#[async_trait]
pub trait SentimentModel: Send + Sync {
    fn name(&self) -> &str;

    async fn predict(&self, text: &str) -> Result<ClassProbabilities>;
}

/// Загружает модель один раз при старте процесса
pub fn build_model(config: &AppConfig) -> Result<Arc<dyn SentimentModel>> {
    match config.model_backend {
        ModelBackend::HuggingFace => {
            let model = HuggingFaceModel::new(
                &config.huggingface_api_url,
                &config.huggingface_api_key,
                config.request_timeout(),
            )?;
            Ok(Arc::new(model))
        }
        ModelBackend::Lexicon => Ok(Arc::new(LexiconModel::new())),
    }
}

/// FinBERT через Hugging Face Inference API
#[derive(Clone)]
pub struct HuggingFaceModel {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HuggingFaceModel {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        Ok(HuggingFaceModel {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SentimentModel for HuggingFaceModel {
    fn name(&self) -> &str {
        "huggingface-finbert"
    }

    async fn predict(&self, text: &str) -> Result<ClassProbabilities> {
        let payload = json!({
            "inputs": truncate_words(text, MAX_INPUT_CHARS),
            "options": { "wait_for_model": true },
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SentimentError::ModelUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Неизвестная ошибка".to_string());
            tracing::warn!("Hugging Face API вернул ошибку: {}", status);
            return Err(SentimentError::ModelUnavailable(format!(
                "Hugging Face API error: {} - {}",
                status, error_text
            )));
        }

        let result: Value = response.json().await?;
        parse_probabilities(&result)
    }
}

/// Разбирает ответ вида `[[{label, score}, ...]]` или `[{label, score}, ...]`
pub fn parse_probabilities(result: &Value) -> Result<ClassProbabilities> {
    let predictions = match result.as_array() {
        Some(outer) => match outer.first() {
            Some(Value::Array(inner)) => inner.as_slice(),
            _ => outer.as_slice(),
        },
        None => {
            return Err(SentimentError::InvalidDataFormat(format!(
                "Некорректный формат ответа от Hugging Face: {}",
                result
            )))
        }
    };

    let mut probabilities = ClassProbabilities::default();
    let mut matched = 0;
    for prediction in predictions {
        let label = prediction["label"].as_str();
        let score = prediction["score"].as_f64();
        let (Some(label), Some(score)) = (label, score) else {
            continue;
        };
        match label.to_ascii_lowercase().as_str() {
            "negative" => probabilities.negative = score,
            "neutral" => probabilities.neutral = score,
            "positive" => probabilities.positive = score,
            other => {
                tracing::debug!("Неизвестный класс в ответе модели: {}", other);
                continue;
            }
        }
        matched += 1;
    }

    if matched == 0 {
        return Err(SentimentError::InvalidDataFormat(format!(
            "В ответе модели нет известных классов: {}",
            result
        )));
    }

    Ok(probabilities)
}

fn truncate_words(text: &str, max_chars: usize) -> String {
    let mut truncated = String::new();
    for word in text.split_whitespace() {
        if truncated.is_empty() && word.len() > max_chars {
            return word.chars().take(max_chars).collect();
        }
        let needed = if truncated.is_empty() { word.len() } else { word.len() + 1 };
        if truncated.len() + needed > max_chars {
            break;
        }
        if !truncated.is_empty() {
            truncated.push(' ');
        }
        truncated.push_str(word);
    }
    truncated
}

/// Офлайн-модель по словарю: для запуска без Hugging Face.
///
/// В конвейере получает уже нормализованный текст: "not", "no" и "nor" к этому
/// моменту удалены как стоп-слова, поэтому отрицание держится на словах из
/// `NEGATION_WORDS`, которые нормализация сохраняет.
#[derive(Clone, Default)]
pub struct LexiconModel;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "strong", "positive", "bullish", "surge", "surged",
    "rally", "gain", "gained", "profit", "rise", "rose", "increase", "growth", "boom",
    "success", "breakthrough", "beat", "outperform", "upgrade", "record", "soar", "soared",
    "jump", "jumped", "optimistic", "buy",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "weak", "terrible", "negative", "bearish", "crash", "dump", "loss", "fall",
    "fell", "decline", "declined", "drop", "dropped", "collapse", "lawsuit", "probe",
    "scandal", "miss", "downgrade", "underperform", "plunge", "plunged", "slump", "cut",
    "layoff", "recall", "fraud", "sell", "risk",
];

// "not" и "no" срабатывают только на сыром тексте
const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "without", "neither", "hardly", "barely", "lack",
];

impl LexiconModel {
    pub fn new() -> Self {
        LexiconModel
    }

    fn count(&self, text: &str) -> (i32, i32) {
        let text_lower = text.to_lowercase();
        let words: Vec<&str> = text_lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .collect();

        let mut positive_count = 0;
        let mut negative_count = 0;

        for (i, word) in words.iter().enumerate() {
            let is_negated = i > 0 && NEGATION_WORDS.contains(&words[i - 1]);
            if POSITIVE_WORDS.contains(word) {
                positive_count += if is_negated { -1 } else { 1 };
            }
            if NEGATIVE_WORDS.contains(word) {
                negative_count += if is_negated { -1 } else { 1 };
            }
        }

        (positive_count.max(0), negative_count.max(0))
    }
}

#[async_trait]
impl SentimentModel for LexiconModel {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn predict(&self, text: &str) -> Result<ClassProbabilities> {
        let (positive, negative) = self.count(text);
        let total = (positive + negative) as f64 + 1.0;
        Ok(ClassProbabilities {
            negative: negative as f64 / total,
            neutral: 1.0 / total,
            positive: positive as f64 / total,
        })
    }
}
