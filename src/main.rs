//! Kourt Score Back binary entrypoint wiring REST, SSE, and storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod score;
mod services;

use config::AppConfig;
use dao::score_store::memory::MemoryScoreStore;
use score::{AppState, SharedState};
use services::match_sync::{MatchLifecycle, NoopLifecycle, WebhookLifecycle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let lifecycle: Arc<dyn MatchLifecycle> = match &config.match_completed_url {
        Some(url) => Arc::new(WebhookLifecycle::new(url.clone())),
        None => Arc::new(NoopLifecycle),
    };

    let app_state = AppState::new(config.fanout_capacity, lifecycle);
    attach_storage(app_state.clone()).await;
    tokio::spawn(services::score_events::forward_degraded_transitions(
        app_state.clone(),
    ));

    // Build the HTTP router once the shared state is ready.
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

/// Pick a storage backend: a supervised MongoDB connection when `MONGO_URI`
/// is set, an in-memory store otherwise.
async fn attach_storage(state: SharedState) {
    #[cfg(feature = "mongo-store")]
    if env::var("MONGO_URI").is_ok() {
        use crate::dao::score_store::{
            ScoreStore,
            mongodb::{MongoConfig, MongoScoreStore},
        };

        tokio::spawn(services::storage_supervisor::run(state, || async {
            let config = MongoConfig::from_env().await?;
            let store = MongoScoreStore::connect(config).await?;
            Ok(Arc::new(store) as Arc<dyn ScoreStore>)
        }));
        return;
    }

    info!("no MONGO_URI configured; using in-memory score store");
    state
        .install_score_store(Arc::new(MemoryScoreStore::new()))
        .await;
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
