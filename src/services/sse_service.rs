use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

/// Subscribe to the session-facing event stream.
pub fn subscribe_events(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.events_sse().subscribe()
}

/// Subscribe to the admin-only stream, claiming the single admin token.
pub async fn subscribe_admin(
    state: &SharedState,
) -> Result<(broadcast::Receiver<ServerEvent>, String), ServiceError> {
    let token = claim_admin_token(state).await?;
    let receiver = state.admin_sse().subscribe();
    Ok((receiver, token))
}

/// Identifies the target SSE stream so stream-specific bookkeeping can run
/// when the connection is torn down.
#[derive(Clone)]
pub enum StreamKind {
    Events,
    /// Carries a clone of the shared state so teardown can reset the admin
    /// token once the spawned forwarder completes.
    Admin(SharedState),
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(_)) => {
                            // Skip lagged messages but keep the stream alive.
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Events => tracing::info!("events SSE stream disconnected"),
            StreamKind::Admin(state) => {
                reset_admin_token(state).await;
                tracing::info!("admin SSE stream disconnected")
            }
        }
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Initial handshake payload describing the stream and the current state.
pub async fn handshake(state: &SharedState, stream: &str, token: Option<String>) -> Handshake {
    Handshake {
        stream: stream.to_owned(),
        maintenance: *state.maintenance_watcher().borrow(),
        degraded: state.is_degraded(),
        token,
    }
}

/// Broadcast the handshake onto the given hub so the fresh subscriber sees
/// it as its first event.
pub fn broadcast_handshake(state: &SharedState, handshake: &Handshake) {
    let hub = if handshake.token.is_some() {
        state.admin_sse()
    } else {
        state.events_sse()
    };
    if let Ok(event) = ServerEvent::json(Some("handshake".to_string()), handshake) {
        hub.broadcast(event);
    }
}

/// Reserve the admin token for a new stream, generating one when none
/// exists and failing if another connection already holds it.
async fn claim_admin_token(state: &SharedState) -> Result<String, ServiceError> {
    let mut guard = state.admin_token().lock().await;
    match &mut *guard {
        slot @ None => {
            let token = Uuid::new_v4().simple().to_string();
            slot.replace(token.clone());
            Ok(token)
        }
        Some(_) => Err(ServiceError::Unauthorized(
            "another admin SSE stream is already active".into(),
        )),
    }
}

/// Clear the stored admin token so the next admin connection negotiates a
/// fresh credential.
async fn reset_admin_token(state: SharedState) {
    let mut guard = state.admin_token().lock().await;
    guard.take();
}
