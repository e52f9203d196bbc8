use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::whitelist::{
        AddWhitelistRequest, AddWhitelistResponse, RemoveWhitelistResponse, WhitelistResponse,
    },
    error::AppError,
    services::whitelist_service,
    state::SharedState,
};

/// List whitelisted identities, hiding the placeholder row.
#[utoipa::path(
    get,
    path = "/whitelist",
    tag = "whitelist",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Whitelist entries", body = WhitelistResponse))
)]
pub async fn list_whitelist(State(state): State<SharedState>) -> Json<WhitelistResponse> {
    Json(whitelist_service::list(&state).await)
}

/// Add or update a whitelist entry.
#[utoipa::path(
    post,
    path = "/whitelist",
    tag = "whitelist",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = AddWhitelistRequest,
    responses((status = 200, description = "Add result", body = AddWhitelistResponse))
)]
pub async fn add_entry(
    State(state): State<SharedState>,
    Json(payload): Json<AddWhitelistRequest>,
) -> Result<Json<AddWhitelistResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        whitelist_service::add(&state, payload.id, payload.name).await?,
    ))
}

/// Remove a whitelist entry by identity.
#[utoipa::path(
    delete,
    path = "/whitelist/{id}",
    tag = "whitelist",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
        ("id" = Uuid, Path, description = "Identity to remove"),
    ),
    responses((status = 200, description = "Removal result", body = RemoveWhitelistResponse))
)]
pub async fn remove_entry(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemoveWhitelistResponse>, AppError> {
    Ok(Json(whitelist_service::remove_by_id(&state, id).await?))
}

/// Remove a whitelist entry by display name. Deprecated convenience:
/// display names are not unique and the first match wins.
#[utoipa::path(
    delete,
    path = "/whitelist/by-name/{name}",
    tag = "whitelist",
    params(
        ("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream"),
        ("name" = String, Path, description = "Display name to resolve and remove"),
    ),
    responses((status = 200, description = "Removal result", body = RemoveWhitelistResponse))
)]
pub async fn remove_entry_by_name(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<RemoveWhitelistResponse>, AppError> {
    Ok(Json(whitelist_service::remove_by_name(&state, &name).await?))
}

/// Configure the whitelist routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/whitelist", get(list_whitelist).post(add_entry))
        .route("/whitelist/{id}", delete(remove_entry))
        .route("/whitelist/by-name/{name}", delete(remove_entry_by_name))
}
