use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    error::AppError,
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/events",
    tag = "sse",
    responses((status = 200, description = "Session-facing event stream", content_type = "text/event-stream", body = String))
)]
/// Stream session-facing broadcasts (activation notices, countdown
/// warnings) to any observer.
pub async fn events_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_events(&state);
    info!("new events SSE connection");
    let handshake = sse_service::handshake(&state, "events", None).await;
    sse_service::broadcast_handshake(&state, &handshake);
    sse_service::to_sse_stream(receiver, StreamKind::Events)
}

#[utoipa::path(
    get,
    path = "/sse/admin",
    tag = "sse",
    responses((status = 200, description = "Admin event stream issuing the admin token", content_type = "text/event-stream", body = String))
)]
/// Stream admin-only events, claiming the single admin token.
pub async fn admin_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (receiver, token) = sse_service::subscribe_admin(&state).await?;
    info!("new admin SSE connection");
    let handshake = sse_service::handshake(&state, "admin", Some(token)).await;
    sse_service::broadcast_handshake(&state, &handshake);
    Ok(sse_service::to_sse_stream(
        receiver,
        StreamKind::Admin(state),
    ))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/events", get(events_stream))
        .route("/sse/admin", get(admin_stream))
}
