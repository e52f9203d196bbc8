use axum::{Json, Router, extract::State, routing::{get, post}};
use validator::Validate;

use crate::{
    dto::timer::{CancelTimerResponse, StartTimerRequest, TimerStatus},
    error::AppError,
    services::timer_service,
    state::SharedState,
};

/// Snapshot of the scheduler.
#[utoipa::path(
    get,
    path = "/timer",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Current timer state", body = TimerStatus))
)]
pub async fn get_timer(State(state): State<SharedState>) -> Json<TimerStatus> {
    Json(timer_service::status(&state).await)
}

/// Schedule maintenance activation after the given number of minutes.
#[utoipa::path(
    post,
    path = "/timer/start",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = StartTimerRequest,
    responses(
        (status = 200, description = "Countdown started", body = TimerStatus),
        (status = 409, description = "A timer is already running"),
    )
)]
pub async fn start_timer(
    State(state): State<SharedState>,
    Json(payload): Json<StartTimerRequest>,
) -> Result<Json<TimerStatus>, AppError> {
    payload.validate()?;
    Ok(Json(timer_service::start_timer(&state, payload.minutes).await?))
}

/// Enable maintenance now and schedule deactivation after the countdown.
#[utoipa::path(
    post,
    path = "/timer/end",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    request_body = StartTimerRequest,
    responses(
        (status = 200, description = "Countdown started", body = TimerStatus),
        (status = 409, description = "A timer is already running"),
    )
)]
pub async fn end_timer(
    State(state): State<SharedState>,
    Json(payload): Json<StartTimerRequest>,
) -> Result<Json<TimerStatus>, AppError> {
    payload.validate()?;
    Ok(Json(timer_service::end_timer(&state, payload.minutes).await?))
}

/// Abort the active countdown, leaving the maintenance state as it is.
#[utoipa::path(
    post,
    path = "/timer/cancel",
    tag = "timer",
    params(("X-Admin-Token" = String, Header, description = "Admin token issued by the /sse/admin stream")),
    responses((status = 200, description = "Cancel result", body = CancelTimerResponse))
)]
pub async fn cancel_timer(State(state): State<SharedState>) -> Json<CancelTimerResponse> {
    Json(timer_service::cancel(&state).await)
}

/// Configure the timer routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/timer", get(get_timer))
        .route("/timer/start", post(start_timer))
        .route("/timer/end", post(end_timer))
        .route("/timer/cancel", post(cancel_timer))
}
