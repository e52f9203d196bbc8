use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from session WebSocket clients.
#[serde(tag = "type")]
pub enum SessionInboundMessage {
    /// First message on a fresh socket: who is connecting, and optionally
    /// the shared token granting the bypass capability.
    #[serde(rename = "identification")]
    Identification {
        id: Uuid,
        name: String,
        #[serde(default)]
        bypass_token: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, ToSchema)]
/// Positive acknowledgement sent to a session after admission.
pub struct SessionAck {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to session WebSocket clients.
#[serde(tag = "type")]
pub enum SessionOutboundMessage {
    /// The session is being disconnected; `message` is the rendered kick
    /// text.
    #[serde(rename = "kick")]
    Kick { message: String },
    /// A service-wide broadcast (activation notices, countdown warnings).
    #[serde(rename = "broadcast")]
    Broadcast { message: String },
    /// A notice addressed to this session only.
    #[serde(rename = "notice")]
    Notice { message: String },
}
