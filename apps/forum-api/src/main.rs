use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forum_api::config::Config;
use forum_api::db::kv::{KeyValueStore, MemoryStore, RedisStore};
use forum_api::AppState;
use forum_common::SnowflakeGenerator;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let port = config.port;

    let db = forum_api::db::pool::connect(&config.database_url, config.db_pool_size).await;

    let kv: Arc<dyn KeyValueStore> = match config.redis_url.as_deref() {
        Some(url) => Arc::new(
            RedisStore::connect(url)
                .await
                .expect("failed to connect to redis"),
        ),
        None => {
            tracing::warn!("REDIS_URL not set; sessions are kept in process memory");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState {
        db,
        kv,
        snowflake: Arc::new(SnowflakeGenerator::new(0)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(forum_api::routes::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "forum-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
