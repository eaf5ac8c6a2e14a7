use std::sync::Arc;

use anyhow::Context;
use axum::http::{header::CONTENT_TYPE, HeaderValue, Method};
use cardrelay_backend::config::Config;
use cardrelay_backend::db::event_config_repository::EventConfigRepository;
use cardrelay_backend::db::postgres_event_config_repository::PostgresEventConfigRepository;
use cardrelay_backend::routes::api_router;
use cardrelay_backend::services::card_delivery::{CardSender, WebhookCardSender};
use cardrelay_backend::services::conversations::ConversationRegistry;
use cardrelay_backend::state::AppState;
use cardrelay_backend::worker;
use reqwest::Client;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let pg_pool = establish_connection(&config.database_url).await?;
    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("failed to run database migrations")?;

    let event_config_repo = Arc::new(PostgresEventConfigRepository {
        pool: pg_pool.clone(),
    }) as Arc<dyn EventConfigRepository>;

    let http_client = Client::new();
    let card_sender = Arc::new(WebhookCardSender::new(
        http_client.clone(),
        config.card_webhook_url.clone(),
    )) as Arc<dyn CardSender>;
    let (card_queue, card_receiver) = worker::card_queue(config.card_queue_capacity);
    let delivery_worker = worker::start_card_delivery_worker(card_receiver, card_sender);

    let state = AppState {
        event_config_repo,
        conversations: Arc::new(ConversationRegistry::new()),
        card_queue,
        http_client: Arc::new(http_client),
    };

    let mut app = api_router(state).layer(TraceLayer::new_for_http());
    if let Some(origin) = &config.frontend_origin {
        let origin = origin
            .parse::<HeaderValue>()
            .with_context(|| format!("invalid FRONTEND_ORIGIN `{origin}`"))?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([CONTENT_TYPE]),
        );
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "card relay listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // The router (and its queue sender) is gone; let queued cards drain.
    if let Err(err) = delivery_worker.await {
        tracing::error!(error = %err, "card delivery worker panicked");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Establish a connection to the database and verify it.
async fn establish_connection(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPool::connect(database_url)
        .await
        .context("failed to connect to the database")?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .context("failed to verify database connection")?;

    info!("Successfully connected to the database");
    Ok(pool)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
