use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether maintenance mode is currently active.
    pub maintenance: bool,
}

impl HealthResponse {
    /// Health response for an operational persistence backend.
    pub fn ok(maintenance: bool) -> Self {
        Self {
            status: "ok".to_string(),
            maintenance,
        }
    }

    /// Health response while the persistence backend is unreachable.
    pub fn degraded(maintenance: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            maintenance,
        }
    }
}
