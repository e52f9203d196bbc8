use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use validator::Validate;

use crate::{
    dto::motd::{MotdListResponse, SetMotdRequest, SetMotdResponse},
    error::AppError,
    services::motd_service,
    state::SharedState,
};

/// List the configured ping messages with their rendered lines.
#[utoipa::path(
    get,
    path = "/motd",
    tag = "motd",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Configured ping messages", body = MotdListResponse))
)]
pub async fn list_motds(State(state): State<SharedState>) -> Json<MotdListResponse> {
    Json(motd_service::list(&state).await)
}

/// Replace one line of a ping message; an index one past the end appends a
/// new message.
#[utoipa::path(
    put,
    path = "/motd/{index}/{line}",
    tag = "motd",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
        ("index" = usize, Path, description = "1-based ping message index"),
        ("line" = usize, Path, description = "Line to replace (1 or 2)"),
    ),
    request_body = SetMotdRequest,
    responses((status = 200, description = "Edit result", body = SetMotdResponse))
)]
pub async fn set_motd_line(
    State(state): State<SharedState>,
    Path((index, line)): Path<(usize, usize)>,
    Json(payload): Json<SetMotdRequest>,
) -> Result<Json<SetMotdResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        motd_service::set_line(&state, index, line, payload.text).await?,
    ))
}

/// Configure the motd routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/motd", get(list_motds))
        .route("/motd/{index}/{line}", put(set_motd_line))
}
