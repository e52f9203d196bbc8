use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::format_system_time;
use std::time::SystemTime;

/// Request starting a countdown. Bounded to 28 days; anything outside the
/// range is a validation failure, never a crash.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartTimerRequest {
    /// Minutes until the scheduled state change.
    #[validate(range(min = 1, max = 40320, message = "minutes must be between 1 and 40320"))]
    pub minutes: u64,
}

/// Snapshot of the scheduler, returned by the timer routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct TimerStatus {
    /// Whether a countdown is currently active.
    pub active: bool,
    /// Minutes remaining on the active countdown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<u64>,
    /// The maintenance flag the countdown will switch to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_maintenance: Option<bool>,
    /// RFC 3339 timestamp of when the status was taken.
    pub taken_at: String,
}

impl TimerStatus {
    /// Status for an idle scheduler.
    pub fn idle() -> Self {
        Self {
            active: false,
            remaining_minutes: None,
            target_maintenance: None,
            taken_at: format_system_time(SystemTime::now()),
        }
    }

    /// Status for a running countdown.
    pub fn running(remaining_minutes: u64, target_maintenance: bool) -> Self {
        Self {
            active: true,
            remaining_minutes: Some(remaining_minutes),
            target_maintenance: Some(target_maintenance),
            taken_at: format_system_time(SystemTime::now()),
        }
    }
}

/// Result of a cancel request.
#[derive(Debug, Serialize, ToSchema)]
pub struct CancelTimerResponse {
    /// Whether a countdown was actually cancelled. `false` reports that no
    /// timer was running.
    pub cancelled: bool,
    /// Minutes that were remaining when the countdown was cancelled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_minutes: Option<u64>,
}
