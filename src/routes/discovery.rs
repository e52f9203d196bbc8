use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};

use crate::{
    dto::discovery::DiscoveryResponse, error::AppError, services::motd_service, state::SharedState,
};

/// Payload for a server-list discovery probe.
#[utoipa::path(
    get,
    path = "/ping",
    tag = "discovery",
    responses((status = 200, description = "Discovery payload", body = DiscoveryResponse))
)]
pub async fn discovery(State(state): State<SharedState>) -> Json<DiscoveryResponse> {
    Json(motd_service::discovery(&state).await)
}

/// Custom maintenance icon, when the feature is enabled and an icon file is
/// provisioned.
#[utoipa::path(
    get,
    path = "/icon",
    tag = "discovery",
    responses(
        (status = 200, description = "PNG icon bytes", content_type = "image/png"),
        (status = 404, description = "No custom icon configured"),
    )
)]
pub async fn icon(State(state): State<SharedState>) -> Result<impl IntoResponse, AppError> {
    let bytes = state.icon().read().await.clone();
    match bytes {
        Some(bytes) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "image/png")],
            bytes,
        )),
        None => Err(AppError::NotFound("no custom icon configured".into())),
    }
}

/// Configure the discovery routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/ping", get(discovery))
        .route("/icon", get(icon))
}
