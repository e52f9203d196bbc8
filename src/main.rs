//! Maintenance backend entrypoint wiring the REST, WebSocket, and SSE layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::{AppConfig, StoreBackendConfig};
use dao::config_store::{ConfigStore, file::FileConfigStore};
use state::{AppState, settings::Settings, whitelist::Whitelist};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let store = build_store(&config).await?;

    // A settings document that cannot be loaded at startup is fatal: there
    // is no safe default gating state to fall back to.
    let settings = Settings::load(&store)
        .await
        .context("loading settings document")?;
    let whitelist_entries = store
        .load_whitelist()
        .await
        .context("loading whitelist document")?;
    let whitelist = Whitelist::from_entries(whitelist_entries);
    info!(
        maintenance = settings.is_maintenance(),
        whitelist_entries = whitelist.list().len(),
        "documents loaded"
    );

    let app_state = AppState::new(config, store, settings, whitelist);
    if let Err(err) = app_state.refresh_icon().await {
        warn!(error = %err, "failed to load the custom maintenance icon");
    }

    tokio::spawn(services::storage_supervisor::run(app_state.clone()));
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

/// Construct the persistence backend selected by the runtime configuration.
async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ConfigStore>> {
    match &config.backend {
        StoreBackendConfig::File => {
            let store = FileConfigStore::open(&config.data_dir)
                .await
                .context("opening file store")?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "mongo-store")]
        StoreBackendConfig::Mongo { uri, database } => {
            use dao::config_store::file::ICON_FILE;
            use dao::config_store::mongodb::{MongoConfig, MongoConfigStore};

            let mongo_config = MongoConfig::from_uri(uri, database.as_deref())
                .await
                .context("parsing MongoDB URI")?;
            let icon_path = config.data_dir.join(ICON_FILE);
            let store = MongoConfigStore::connect(mongo_config, icon_path)
                .await
                .context("connecting to MongoDB")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo-store"))]
        StoreBackendConfig::Mongo { .. } => {
            anyhow::bail!("MAINTENANCE_STORE=mongo requires the `mongo-store` feature")
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
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
