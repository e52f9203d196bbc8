use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Health payload combining the persistence backend check with the current
/// gating state.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let maintenance = state.phase().await.as_flag();

    if let Err(err) = state.store().health_check().await {
        warn!(error = %err, "storage health check failed");
        return HealthResponse::degraded(maintenance);
    }

    if state.is_degraded() {
        HealthResponse::degraded(maintenance)
    } else {
        HealthResponse::ok(maintenance)
    }
}
