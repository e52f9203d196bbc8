use serde::Serialize;
use utoipa::ToSchema;

/// Payload answering a server-list discovery probe. The host integration
/// layer turns this into whatever wire format its client list uses.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiscoveryResponse {
    /// Whether maintenance mode is active.
    pub maintenance: bool,
    /// Rendered ping message chosen for this probe.
    pub motd: String,
    /// Text replacing the player count while maintenance is active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_count_text: Option<String>,
    /// Hover text accompanying the player-count slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_count_hover: Option<String>,
    /// Number of currently connected sessions.
    pub online_sessions: usize,
    /// Whether a custom icon is available at `/icon`.
    pub custom_icon: bool,
}
