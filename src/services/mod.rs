/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// The authoritative maintenance state transitions.
pub mod maintenance_service;
/// Ping message management and discovery payloads.
pub mod motd_service;
/// Session registry, connect-time gating, and eviction.
pub mod session_service;
/// Server-sent event message generation.
pub mod sse_events;
/// Server-sent event broadcasting service.
pub mod sse_service;
/// Storage health polling and degraded-mode coordination.
pub mod storage_supervisor;
/// Countdown scheduling and tick processing.
pub mod timer_service;
/// Whitelist management operations.
pub mod whitelist_service;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use axum::extract::ws::Message;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use crate::{
        config::{AppConfig, StoreBackendConfig},
        dao::config_store::{ConfigStore, file::FileConfigStore},
        state::{AppState, SessionConnection, SharedState, settings::Settings, whitelist::Whitelist},
    };

    /// Shared bypass token used by service tests.
    pub(crate) const BYPASS_TOKEN: &str = "let-me-in";

    /// Fresh application state backed by a file store in a unique temp
    /// directory.
    pub(crate) async fn test_state() -> SharedState {
        let dir = std::env::temp_dir().join(format!("maintenance-back-{}", Uuid::new_v4()));
        let store: Arc<dyn ConfigStore> = Arc::new(FileConfigStore::open(&dir).await.unwrap());
        let settings = Settings::load(&store).await.unwrap();
        let entries = store.load_whitelist().await.unwrap();
        let config = AppConfig {
            data_dir: dir,
            backend: StoreBackendConfig::File,
            bypass_token: Some(BYPASS_TOKEN.into()),
        };
        AppState::new(config, store, settings, Whitelist::from_entries(entries))
    }

    /// Register a fake connected session and hand back its outbound channel.
    pub(crate) fn insert_session(
        state: &SharedState,
        bypass: bool,
    ) -> (Uuid, mpsc::UnboundedReceiver<Message>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        state.sessions().insert(
            id,
            SessionConnection {
                id,
                name: format!("session-{}", id.simple()),
                bypass,
                tx,
            },
        );
        (id, rx)
    }
}
