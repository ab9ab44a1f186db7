//! Festival bracket backend entrypoint wiring REST, SSE and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fest_bracket_back::{
    config::AppConfig,
    dao::fest_store::memory::MemoryFestStore,
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let admin_key = env::var("ADMIN_KEY").ok();
    if admin_key.as_deref().is_none_or(str::is_empty) {
        warn!("ADMIN_KEY is not set; admin routes will reject every request");
    }

    let app_state = AppState::new(config, admin_key);
    start_storage(app_state.clone()).await?;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the backend chosen by `STORAGE_BACKEND` (`mongo` by default, or `memory`).
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "mongo".into());
    match backend.trim().to_ascii_lowercase().as_str() {
        "memory" => {
            info!("using in-memory storage; data is lost on restart");
            state.set_store(Arc::new(MemoryFestStore::new())).await;
            Ok(())
        }
        "mongo" | "mongodb" => spawn_mongo(state),
        other => anyhow::bail!("unknown STORAGE_BACKEND `{other}` (expected `mongo` or `memory`)"),
    }
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo(state: SharedState) -> anyhow::Result<()> {
    use fest_bracket_back::dao::{
        fest_store::{
            FestStore,
            mongodb::{MongoConfig, MongoFestStore},
        },
        storage::StorageError,
    };
    use fest_bracket_back::services::storage_supervisor;

    tokio::spawn(storage_supervisor::run(state, || async {
        let config = MongoConfig::from_env().await.map_err(StorageError::from)?;
        let store = MongoFestStore::connect(config)
            .await
            .map_err(StorageError::from)?;
        Ok::<Arc<dyn FestStore>, StorageError>(Arc::new(store))
    }));
    Ok(())
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo(_state: SharedState) -> anyhow::Result<()> {
    anyhow::bail!("built without the `mongo-store` feature; set STORAGE_BACKEND=memory")
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
