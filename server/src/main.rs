//! Attendance server binary.

use rollcall_core::{CacheConfig, CheckinConfig, HubConfig, TokenConfig, TokenCodec};
use rollcall_server::cache::RedisRosterCache;
use rollcall_server::config::ServerConfig;
use rollcall_server::store::PostgresStore;
use rollcall_server::{AppState, BroadcastHub, CheckinPipeline};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    let store = PostgresStore::new(pool);
    store.migrate().await?;

    let cache = RedisRosterCache::new(&config.redis_url, &CacheConfig::default()).await?;

    let hub = BroadcastHub::new(HubConfig::default());
    let heartbeat = hub.spawn_heartbeat();

    let codec = TokenCodec::new(&TokenConfig::new(config.qr_secret.clone()));
    let pipeline = CheckinPipeline::new(
        store,
        cache,
        hub.clone(),
        codec.clone(),
        CheckinConfig::default(),
    );

    let state = AppState::new(pipeline, hub.clone(), codec);
    let app = rollcall_server::router::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Attendance server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    heartbeat.abort();
    hub.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => tracing::error!(%error, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
