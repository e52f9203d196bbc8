use serde::Serialize;
use utoipa::ToSchema;

/// Current gating state plus what a toggle changed.
#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceStatus {
    /// Whether maintenance mode is active.
    pub maintenance: bool,
    /// Whether the last request actually flipped the flag. `false` means
    /// the call was idempotent: the flag was re-persisted but no broadcast
    /// or eviction ran.
    pub changed: bool,
    /// Sessions evicted by this transition, when it activated maintenance.
    pub kicked_sessions: usize,
    /// Sessions currently connected.
    pub online_sessions: usize,
}

/// Result of a configuration reload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    /// Whether maintenance mode is active after the reload.
    pub maintenance: bool,
    /// Number of ping message templates now loaded.
    pub ping_messages: usize,
    /// Number of whitelist entries now loaded (placeholder excluded).
    pub whitelist_entries: usize,
}
