use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{SessionAck, SessionInboundMessage, SessionOutboundMessage},
    state::{MaintenancePhase, SessionConnection, SharedState},
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of evaluating an identification against the current gating state.
enum Admission {
    /// Session may stay connected; `notify` asks for the join notice.
    Admitted { notify: bool },
    /// Session is turned away with the rendered kick message.
    Refused { kick_message: String },
}

/// Handle the full lifecycle of an individual session WebSocket connection:
/// identification, gating, registration, and teardown.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("session identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match serde_json::from_str::<SessionInboundMessage>(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse session message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let SessionInboundMessage::Identification {
        id,
        name,
        bypass_token,
    } = inbound
    else {
        warn!("first message was not an identification");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    let bypass = has_bypass(&state, bypass_token.as_deref());

    match admission(&state, id, bypass).await {
        Admission::Refused { kick_message } => {
            info!(%id, name, "refusing session during maintenance");
            let _ = send_to_session(
                &outbound_tx,
                &SessionOutboundMessage::Kick {
                    message: kick_message,
                },
            );
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Admission::Admitted { notify } => {
            state.sessions().insert(
                id,
                SessionConnection {
                    id,
                    name: name.clone(),
                    bypass,
                    tx: outbound_tx.clone(),
                },
            );
            info!(%id, name, bypass, "session connected");

            let ack = SessionAck {
                id,
                status: "connected".to_owned(),
            };
            if send_json(&outbound_tx, &ack).is_err() {
                state.sessions().remove(&id);
                finalize(writer_task, outbound_tx).await;
                return;
            }

            if notify {
                let message = state.settings().read().await.join_notification();
                let _ = send_to_session(&outbound_tx, &SessionOutboundMessage::Notice { message });
            }
        }
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Close(_)) => break,
            Ok(Message::Text(text)) => {
                debug!(%id, payload = %text, "ignoring inbound session message")
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%id, error = %err, "websocket receive error");
                break;
            }
        }
    }

    // The registry entry may already be gone when the session was evicted.
    if state.sessions().remove(&id).is_some() {
        info!(%id, "session disconnected");
    }
    finalize(writer_task, outbound_tx).await;
}

/// Decide whether an identification may stay connected right now.
async fn admission(state: &SharedState, id: Uuid, bypass: bool) -> Admission {
    if state.phase().await != MaintenancePhase::Maintenance {
        return Admission::Admitted { notify: false };
    }

    let exempt = bypass || state.whitelist().read().await.contains(id);
    if !exempt {
        let kick_message = state.settings().read().await.kick_message();
        return Admission::Refused { kick_message };
    }

    let notify = state.settings().read().await.send_join_notification();
    Admission::Admitted { notify }
}

/// The bypass capability is decided outside the core; here it is a shared
/// token the host integration hands to privileged sessions.
fn has_bypass(state: &SharedState, token: Option<&str>) -> bool {
    match (&state.config().bypass_token, token) {
        (Some(expected), Some(provided)) => expected == provided,
        _ => false,
    }
}

/// Send a broadcast message to every connected session, pruning connections
/// whose writer has gone away.
pub fn broadcast_to_sessions(state: &SharedState, message: &str) {
    let payload = SessionOutboundMessage::Broadcast {
        message: message.to_owned(),
    };

    let mut dead = Vec::new();
    for entry in state.sessions().iter() {
        if send_to_session(&entry.tx, &payload).is_err() {
            dead.push(entry.id);
        }
    }
    for id in dead {
        state.sessions().remove(&id);
    }
}

/// Evict every connected session that is neither bypass-capable nor
/// whitelisted. Runs strictly after the flag flipped to maintenance, so the
/// rendered kick message belongs to the new state.
pub async fn evict_gated_sessions(state: &SharedState, kick_message: &str) -> usize {
    let whitelist = state.whitelist().read().await;
    let to_kick: Vec<SessionConnection> = state
        .sessions()
        .iter()
        .filter(|entry| !entry.bypass && !whitelist.contains(entry.id))
        .map(|entry| entry.value().clone())
        .collect();
    drop(whitelist);

    let payload = SessionOutboundMessage::Kick {
        message: kick_message.to_owned(),
    };
    let mut kicked = 0;
    for connection in to_kick {
        let _ = send_to_session(&connection.tx, &payload);
        let _ = connection.tx.send(Message::Close(None));
        if state.sessions().remove(&connection.id).is_some() {
            kicked += 1;
            info!(id = %connection.id, name = %connection.name, "evicted session for maintenance");
        }
    }
    kicked
}

fn send_to_session(
    tx: &mpsc::UnboundedSender<Message>,
    message: &SessionOutboundMessage,
) -> Result<(), ()> {
    send_json(tx, message)
}

fn send_json<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> Result<(), ()>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            // Serialization failure is a bug in our own payload types, not a
            // connection problem; log and keep the connection.
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Drain and stop the writer task once the connection is finished.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        maintenance_service,
        test_support::{BYPASS_TOKEN, insert_session, test_state},
        whitelist_service,
    };

    #[tokio::test]
    async fn admission_follows_the_gating_rules() {
        let state = test_state().await;
        let stranger = Uuid::new_v4();

        assert!(matches!(
            admission(&state, stranger, false).await,
            Admission::Admitted { notify: false }
        ));

        maintenance_service::set_maintenance(&state, true).await.unwrap();
        assert!(matches!(
            admission(&state, stranger, false).await,
            Admission::Refused { .. }
        ));
        assert!(matches!(
            admission(&state, stranger, true).await,
            Admission::Admitted { notify: true }
        ));

        let listed = Uuid::new_v4();
        whitelist_service::add(&state, listed, "Listed".into())
            .await
            .unwrap();
        assert!(matches!(
            admission(&state, listed, false).await,
            Admission::Admitted { notify: true }
        ));
    }

    #[tokio::test]
    async fn bypass_requires_the_configured_token() {
        let state = test_state().await;
        assert!(has_bypass(&state, Some(BYPASS_TOKEN)));
        assert!(!has_bypass(&state, Some("wrong")));
        assert!(!has_bypass(&state, None));
    }

    #[tokio::test]
    async fn broadcast_reaches_sessions_and_prunes_dead_ones() {
        let state = test_state().await;
        let (alive_id, mut alive_rx) = insert_session(&state, false);
        let (dead_id, dead_rx) = insert_session(&state, false);
        drop(dead_rx);

        broadcast_to_sessions(&state, "hello there");

        assert!(state.sessions().contains_key(&alive_id));
        assert!(!state.sessions().contains_key(&dead_id));
        match alive_rx.recv().await.unwrap() {
            Message::Text(text) => assert!(text.contains("hello there")),
            other => panic!("expected text payload, got {other:?}"),
        }
    }
}
