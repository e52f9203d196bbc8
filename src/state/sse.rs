use tokio::sync::{Mutex, broadcast};

use crate::dto::sse::ServerEvent;

/// SSE sub-state: one hub mirroring session-facing broadcasts to any
/// observer, and one admin hub whose single subscriber holds the admin
/// token used to authorize mutating routes.
pub struct SseState {
    events: SseHub,
    admin: AdminSseState,
}

impl SseState {
    /// Build the SSE sub-tree with per-stream channel capacities.
    pub fn new(events_capacity: usize, admin_capacity: usize) -> Self {
        Self {
            events: SseHub::new(events_capacity),
            admin: AdminSseState::new(admin_capacity),
        }
    }

    /// Hub fanning out session-facing broadcasts (activation, warnings).
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Admin hub plus its coordinating token.
    pub fn admin(&self) -> &AdminSseState {
        &self.admin
    }
}

/// State bundle holding the admin SSE hub and its coordinating token.
pub struct AdminSseState {
    hub: SseHub,
    token: Mutex<Option<String>>,
}

impl AdminSseState {
    fn new(capacity: usize) -> Self {
        Self {
            hub: SseHub::new(capacity),
            token: Mutex::new(None),
        }
    }

    /// Broadcast hub for admin-only events.
    pub fn hub(&self) -> &SseHub {
        &self.hub
    }

    /// Token mutex coordinating the single admin connection.
    pub fn token(&self) -> &Mutex<Option<String>> {
        &self.token
    }
}

/// Broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a hub backed by a tokio broadcast channel.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a subscriber receiving subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
