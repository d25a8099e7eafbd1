use anyhow::Context;
use std::net::SocketAddr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use ticker_sentiment::routers::create_routes;
use ticker_sentiment::{
    build_model, load_config, AppConfig, AppState, NewsCollectorService,
    SentimentAnalysisService, SentimentClassifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    let _log_guard = init_tracing(&config);

    // Модель и ключ API загружаются один раз на процесс
    let model = build_model(&config).context("Не удалось создать модель классификации")?;
    let classifier = SentimentClassifier::new(model);
    classifier
        .warm_up()
        .await
        .context("Модель классификации недоступна при старте")?;

    let collector = NewsCollectorService::new(&config)?;
    let analysis = SentimentAnalysisService::new(collector, classifier, &config)?;
    let app = create_routes(AppState::new(analysis));

    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Сервер запущен на http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

// Настройка структурированного логирования
fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ticker_sentiment=info,warn"));

    let stdout_layer = if config.log_json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "ticker_sentiment.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Не удалось установить обработчик сигнала: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Получен сигнал остановки");
}
