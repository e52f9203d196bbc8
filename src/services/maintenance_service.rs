use tracing::info;

use crate::{
    dto::maintenance::{MaintenanceStatus, ReloadResponse},
    error::ServiceError,
    state::{
        SharedState,
        machine::{MaintenanceEvent, MaintenancePhase},
        settings::Settings,
        whitelist::Whitelist,
    },
};

use super::{session_service, sse_events, timer_service};

/// The single authoritative transition operation. Serializes on the
/// mutation gate, persists the new flag before applying it, and fans out
/// eviction and broadcasts strictly after the flag changed.
pub async fn set_maintenance(
    state: &SharedState,
    target: bool,
) -> Result<MaintenanceStatus, ServiceError> {
    let _gate = state.mutation_gate().lock().await;
    set_maintenance_locked(state, target).await
}

/// Transition body for callers already holding the mutation gate (the
/// scheduler uses this from inside its own gated sections).
pub(crate) async fn set_maintenance_locked(
    state: &SharedState,
    target: bool,
) -> Result<MaintenanceStatus, ServiceError> {
    let target_phase = MaintenancePhase::from_flag(target);
    let current = state.phase().await;

    let staged = {
        let settings = state.settings().read().await;
        let mut entity = settings.entity();
        entity.maintenance = target;
        entity
    };

    if target_phase == current {
        // Idempotent request: re-persist the flag, skip every other side
        // effect. See DESIGN.md for this resolution of the open question.
        state.store().save_settings(staged.clone()).await?;
        state.settings().write().await.commit(staged);
        info!(maintenance = target, "maintenance flag re-persisted without transition");
        return Ok(MaintenanceStatus {
            maintenance: target,
            changed: false,
            kicked_sessions: 0,
            online_sessions: state.sessions().len(),
        });
    }

    let store = state.store();
    let persisted = staged.clone();
    let (_, next) = state
        .run_transition(MaintenanceEvent::towards(target_phase), move || async move {
            store
                .save_settings(persisted)
                .await
                .map_err(ServiceError::from)
        })
        .await?;
    state.settings().write().await.commit(staged);

    // A manual toggle supersedes a scheduled one; the countdown dies only
    // once the transition actually went through.
    if let Some(remaining) = timer_service::clear_active(state).await {
        info!(remaining, "cancelled scheduled timer superseded by manual toggle");
        sse_events::broadcast_timer_cancelled(state, remaining);
    }

    let (message, kicked) = match next {
        MaintenancePhase::Maintenance => {
            let (kick_message, activation) = {
                let settings = state.settings().read().await;
                (settings.kick_message(), settings.activation_message())
            };
            let kicked = session_service::evict_gated_sessions(state, &kick_message).await;
            session_service::broadcast_to_sessions(state, &activation);
            (activation, kicked)
        }
        MaintenancePhase::Normal => {
            let deactivation = state.settings().read().await.deactivation_message();
            session_service::broadcast_to_sessions(state, &deactivation);
            (deactivation, 0)
        }
    };

    sse_events::broadcast_maintenance_changed(state, next.as_flag(), &message, kicked);
    info!(
        maintenance = next.as_flag(),
        kicked, "maintenance state changed"
    );

    Ok(MaintenanceStatus {
        maintenance: next.as_flag(),
        changed: true,
        kicked_sessions: kicked,
        online_sessions: state.sessions().len(),
    })
}

/// Current gating state for the status route.
pub async fn status(state: &SharedState) -> MaintenanceStatus {
    MaintenanceStatus {
        maintenance: state.phase().await.as_flag(),
        changed: false,
        kicked_sessions: 0,
        online_sessions: state.sessions().len(),
    }
}

/// Re-load both documents from the backing medium and re-apply dependent
/// recomputation (machine phase, icon cache). A failure leaves the
/// in-memory mirrors untouched.
pub async fn reload(state: &SharedState) -> Result<ReloadResponse, ServiceError> {
    let _gate = state.mutation_gate().lock().await;

    let settings = Settings::load(&state.store()).await?;
    let entries = state.store().load_whitelist().await?;

    let phase = MaintenancePhase::from_flag(settings.is_maintenance());
    state.resync_phase(phase).await?;

    let ping_messages = settings.ping_messages().len();
    *state.settings().write().await = settings;
    *state.whitelist().write().await = Whitelist::from_entries(entries);
    state.refresh_icon().await?;

    let whitelist_entries = state.whitelist().read().await.list().len();
    info!(ping_messages, whitelist_entries, "configuration reloaded");

    Ok(ReloadResponse {
        maintenance: phase.as_flag(),
        ping_messages,
        whitelist_entries,
    })
}

#[cfg(test)]
mod tests {
    use axum::extract::ws::Message;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::services::{
        test_support::{insert_session, test_state},
        whitelist_service,
    };

    #[tokio::test]
    async fn activation_evicts_only_gated_sessions() {
        let state = test_state().await;
        let (gated_id, mut gated_rx) = insert_session(&state, false);
        let (bypass_id, _bypass_rx) = insert_session(&state, true);
        let (listed_id, _listed_rx) = insert_session(&state, false);
        whitelist_service::add(&state, listed_id, "Listed".into())
            .await
            .unwrap();

        let status = set_maintenance(&state, true).await.unwrap();
        assert!(status.maintenance);
        assert!(status.changed);
        assert_eq!(status.kicked_sessions, 1);
        assert!(!state.sessions().contains_key(&gated_id));
        assert!(state.sessions().contains_key(&bypass_id));
        assert!(state.sessions().contains_key(&listed_id));

        match gated_rx.recv().await.unwrap() {
            Message::Text(text) => assert!(text.contains("kick")),
            other => panic!("expected kick payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repeated_activation_re_persists_without_side_effects() {
        let state = test_state().await;
        set_maintenance(&state, true).await.unwrap();

        // A gated session in the registry must survive the idempotent call.
        let (session_id, _rx) = insert_session(&state, false);
        let mut events = state.events_sse().subscribe();

        let status = set_maintenance(&state, true).await.unwrap();
        assert!(status.maintenance);
        assert!(!status.changed);
        assert_eq!(status.kicked_sessions, 0);
        assert!(state.sessions().contains_key(&session_id));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn deactivation_broadcasts_without_evicting() {
        let state = test_state().await;
        set_maintenance(&state, true).await.unwrap();
        let (session_id, mut rx) = insert_session(&state, true);

        let status = set_maintenance(&state, false).await.unwrap();
        assert!(!status.maintenance);
        assert!(status.changed);
        assert_eq!(status.kicked_sessions, 0);
        assert!(state.sessions().contains_key(&session_id));

        match rx.recv().await.unwrap() {
            Message::Text(text) => assert!(text.contains("broadcast")),
            other => panic!("expected broadcast payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_persistence_leaves_state_untouched() {
        let state = test_state().await;
        let data_dir = state.config().data_dir.clone();
        tokio::fs::remove_dir_all(&data_dir).await.unwrap();

        let err = set_maintenance(&state, true).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
        assert!(!state.phase().await.as_flag());
        assert!(!state.settings().read().await.is_maintenance());

        // Once the medium is back, the same transition goes through.
        tokio::fs::create_dir_all(&data_dir).await.unwrap();
        let status = set_maintenance(&state, true).await.unwrap();
        assert!(status.maintenance);
    }

    #[tokio::test]
    async fn reload_adopts_external_state_without_evictions() {
        let state = test_state().await;
        let (session_id, _rx) = insert_session(&state, false);

        let mut staged = state.settings().read().await.entity();
        staged.maintenance = true;
        staged.ping_messages = vec!["&cBack soon".into(), "&cHang tight".into()];
        state.store().save_settings(staged).await.unwrap();

        let response = reload(&state).await.unwrap();
        assert!(response.maintenance);
        assert_eq!(response.ping_messages, 2);
        assert!(state.phase().await.as_flag());
        assert!(state.sessions().contains_key(&session_id));
    }
}
