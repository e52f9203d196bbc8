use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`events` or `admin`).
    pub stream: String,
    /// Whether maintenance mode is currently active.
    pub maintenance: bool,
    /// Whether the backend is running without a healthy persistence backend.
    pub degraded: bool,
    /// Optional admin token returned when the stream is privileged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the maintenance flag flips.
pub struct MaintenanceChangedEvent {
    /// The flag after the transition.
    pub maintenance: bool,
    /// Rendered activation or deactivation message shown to sessions.
    pub message: String,
    /// How many sessions were evicted by this transition.
    pub kicked_sessions: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast at each configured remaining-minutes mark of a countdown.
pub struct TimerWarningEvent {
    /// Minutes left until the scheduled transition.
    pub remaining_minutes: u64,
    /// Rendered warning message shown to sessions.
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast exactly once when a countdown reaches zero, distinct from the
/// interval warnings that preceded it.
pub struct TimerEndedEvent {
    /// The maintenance flag the countdown switched to.
    pub maintenance: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a countdown is cancelled before reaching zero.
pub struct TimerCancelledEvent {
    /// Minutes that were still remaining at cancellation.
    pub remaining_minutes: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Admin-plane notification of a whitelist change.
pub struct WhitelistChangedEvent {
    /// Affected identity.
    pub id: Uuid,
    /// Display name at the time of the change.
    pub name: String,
    /// `added` or `removed`.
    pub action: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}
