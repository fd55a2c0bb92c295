//! Quiz Rush Back binary entrypoint wiring the WebSocket protocol, the HTTP
//! surface, and the snapshot store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_rush_back::{
    config::AppConfig,
    dao::snapshot_store::{SnapshotStore, memory::MemorySnapshotStore},
    routes,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = select_snapshot_store(&config).await;
    info!(mode = store.mode(), "snapshot store selected");

    let app_state = AppState::new(config, store);
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the snapshot store backend once for the process lifetime: the
/// remote store when it is configured and reachable, else the in-memory
/// fallback. Per-call backend switching never happens.
async fn select_snapshot_store(config: &AppConfig) -> Arc<dyn SnapshotStore> {
    #[cfg(feature = "couch-store")]
    {
        use quiz_rush_back::dao::snapshot_store::couchdb::{CouchConfig, CouchSnapshotStore};
        use tracing::warn;

        match CouchConfig::from_env() {
            Some(couch) => {
                match CouchSnapshotStore::connect(
                    couch,
                    config.key_prefix(),
                    config.snapshot_ttl_ms(),
                )
                .await
                {
                    Ok(store) => {
                        info!("connected to CouchDB snapshot store");
                        return Arc::new(store);
                    }
                    Err(err) => {
                        warn!(error = %err, "CouchDB unreachable; falling back to in-memory store");
                    }
                }
            }
            None => info!("COUCH_BASE_URL not set; using in-memory snapshot store"),
        }
    }

    Arc::new(MemorySnapshotStore::new(
        config.key_prefix(),
        config.snapshot_ttl_ms(),
    ))
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
