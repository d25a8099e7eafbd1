use anyhow::Result;
use config::Config;
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";
pub const DEFAULT_HUGGINGFACE_API_URL: &str =
    "https://api-inference.huggingface.co/models/ProsusAI/finbert";

const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    HuggingFace,
    Lexicon,
}

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    pub bind_address: String,
    pub alpha_vantage_url: String,
    #[serde(default)]
    pub alpha_vantage_api_key: String,
    pub model_backend: ModelBackend,
    pub huggingface_api_url: String,
    #[serde(default)]
    pub huggingface_api_key: String,
    pub max_articles: Option<usize>,
    pub max_concurrent_requests: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Валидация конфигурации
    pub fn validate(&self) -> Result<()> {
        if self.alpha_vantage_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("Alpha Vantage API key cannot be empty"));
        }

        if !self.alpha_vantage_url.starts_with("http") {
            return Err(anyhow::anyhow!("alpha_vantage_url must be an http(s) URL"));
        }

        if self.model_backend == ModelBackend::HuggingFace {
            if self.huggingface_api_key.trim().is_empty() {
                return Err(anyhow::anyhow!(
                    "Hugging Face API key is required for the huggingface backend"
                ));
            }
            if !self.huggingface_api_url.starts_with("http") {
                return Err(anyhow::anyhow!("huggingface_api_url must be an http(s) URL"));
            }
        }

        self.bind_address
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("Invalid bind_address {}: {}", self.bind_address, e))?;

        if let Some(max_articles) = self.max_articles {
            if max_articles == 0 || max_articles > 1000 {
                return Err(anyhow::anyhow!("max_articles must be between 1 and 1000"));
            }
        }

        if let Some(max_concurrent) = self.max_concurrent_requests {
            if max_concurrent == 0 || max_concurrent > 50 {
                return Err(anyhow::anyhow!("max_concurrent_requests must be between 1 and 50"));
            }
        }

        if let Some(timeout) = self.request_timeout_secs {
            if timeout == 0 || timeout > 120 {
                return Err(anyhow::anyhow!("request_timeout_secs must be between 1 and 120"));
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent_requests
            .unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS)
    }
}

pub fn load_config() -> Result<AppConfig> {
    // Загружаем .env файл
    dotenvy::dotenv().ok();

    let settings = Config::builder()
        .set_default("bind_address", "0.0.0.0:8000")?
        .set_default("alpha_vantage_url", DEFAULT_ALPHA_VANTAGE_URL)?
        .set_default("model_backend", "huggingface")?
        .set_default("huggingface_api_url", DEFAULT_HUGGINGFACE_API_URL)?
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("TICKER_SENTIMENT").try_parsing(true))
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // Ключи читаются один раз при старте; без ключа Alpha Vantage сервис не запускается
    config.alpha_vantage_api_key = env::var("ALPHA_VANTAGE_API_KEY")
        .map_err(|_| anyhow::anyhow!("ALPHA_VANTAGE_API_KEY environment variable is required"))?;

    if config.model_backend == ModelBackend::HuggingFace {
        config.huggingface_api_key = env::var("HUGGINGFACE_API_KEY").map_err(|_| {
            anyhow::anyhow!("HUGGINGFACE_API_KEY environment variable is required")
        })?;
    }

    config.validate()?;

    Ok(config)
}
