use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::{error::AppError, state::SharedState};

pub mod discovery;
pub mod docs;
pub mod health;
pub mod maintenance;
pub mod motd;
pub mod session;
pub mod sse;
pub mod timer;
pub mod whitelist;

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let open_router = health::router()
        .merge(discovery::router())
        .merge(sse::router())
        .merge(session::router());

    let admin_router = maintenance::router()
        .merge(timer::router())
        .merge(whitelist::router())
        .merge(motd::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_token,
        ));

    let docs_router = docs::router(state.clone());

    open_router
        .merge(admin_router)
        .merge(docs_router)
        .with_state(state)
}

/// Require the admin token claimed through the admin SSE stream on every
/// mutating route. Rejections carry the configured no-permission message.
async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    let expected = {
        let guard = state.admin_token().lock().await;
        guard.clone()
    };

    match expected {
        Some(token) if token == provided => Ok(next.run(req).await),
        Some(_) => {
            let message = state.settings().read().await.no_permission_message();
            Err(AppError::Unauthorized(message))
        }
        None => Err(AppError::Unauthorized(
            "admin SSE stream not initialised yet".into(),
        )),
    }
}
