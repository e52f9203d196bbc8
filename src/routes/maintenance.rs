use axum::{Json, Router, extract::State, routing::{get, post}};

use crate::{
    dto::maintenance::{MaintenanceStatus, ReloadResponse},
    error::AppError,
    services::maintenance_service,
    state::SharedState,
};

/// Current maintenance state.
#[utoipa::path(
    get,
    path = "/maintenance",
    tag = "maintenance",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Current maintenance state", body = MaintenanceStatus))
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<MaintenanceStatus> {
    Json(maintenance_service::status(&state).await)
}

/// Enable maintenance mode, evicting non-exempt sessions.
#[utoipa::path(
    post,
    path = "/maintenance/on",
    tag = "maintenance",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Maintenance enabled", body = MaintenanceStatus))
)]
pub async fn enable(
    State(state): State<SharedState>,
) -> Result<Json<MaintenanceStatus>, AppError> {
    Ok(Json(maintenance_service::set_maintenance(&state, true).await?))
}

/// Disable maintenance mode.
#[utoipa::path(
    post,
    path = "/maintenance/off",
    tag = "maintenance",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Maintenance disabled", body = MaintenanceStatus))
)]
pub async fn disable(
    State(state): State<SharedState>,
) -> Result<Json<MaintenanceStatus>, AppError> {
    Ok(Json(
        maintenance_service::set_maintenance(&state, false).await?,
    ))
}

/// Reload the settings and whitelist documents from the backing medium.
#[utoipa::path(
    post,
    path = "/maintenance/reload",
    tag = "maintenance",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Configuration reloaded", body = ReloadResponse))
)]
pub async fn reload(State(state): State<SharedState>) -> Result<Json<ReloadResponse>, AppError> {
    Ok(Json(maintenance_service::reload(&state).await?))
}

/// Configure the maintenance routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/maintenance", get(get_status))
        .route("/maintenance/on", post(enable))
        .route("/maintenance/off", post(disable))
        .route("/maintenance/reload", post(reload))
}
