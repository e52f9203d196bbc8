use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::sse::{
        MaintenanceChangedEvent, ServerEvent, SystemStatus, TimerCancelledEvent, TimerEndedEvent,
        TimerWarningEvent, WhitelistChangedEvent,
    },
    state::SharedState,
};

const EVENT_MAINTENANCE_CHANGED: &str = "maintenance.changed";
const EVENT_TIMER_WARNING: &str = "timer.warning";
const EVENT_TIMER_ENDED: &str = "timer.ended";
const EVENT_TIMER_CANCELLED: &str = "timer.cancelled";
const EVENT_WHITELIST_CHANGED: &str = "whitelist.changed";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast that the maintenance flag flipped, with the rendered message
/// sessions received and the eviction count.
pub fn broadcast_maintenance_changed(
    state: &SharedState,
    maintenance: bool,
    message: &str,
    kicked_sessions: usize,
) {
    let payload = MaintenanceChangedEvent {
        maintenance,
        message: message.to_owned(),
        kicked_sessions,
    };
    send_events_event(state, EVENT_MAINTENANCE_CHANGED, &payload);
    send_admin_event(state, EVENT_MAINTENANCE_CHANGED, &payload);
}

/// Broadcast a countdown warning at a configured remaining-minutes mark.
pub fn broadcast_timer_warning(state: &SharedState, remaining_minutes: u64, message: &str) {
    let payload = TimerWarningEvent {
        remaining_minutes,
        message: message.to_owned(),
    };
    send_events_event(state, EVENT_TIMER_WARNING, &payload);
    send_admin_event(state, EVENT_TIMER_WARNING, &payload);
}

/// Broadcast that a countdown reached zero and applied its target state.
pub fn broadcast_timer_ended(state: &SharedState, maintenance: bool) {
    let payload = TimerEndedEvent { maintenance };
    send_events_event(state, EVENT_TIMER_ENDED, &payload);
    send_admin_event(state, EVENT_TIMER_ENDED, &payload);
}

/// Notify admins that a countdown was cancelled before reaching zero.
pub fn broadcast_timer_cancelled(state: &SharedState, remaining_minutes: u64) {
    let payload = TimerCancelledEvent { remaining_minutes };
    send_admin_event(state, EVENT_TIMER_CANCELLED, &payload);
}

/// Notify admins of a whitelist mutation.
pub fn broadcast_whitelist_changed(state: &SharedState, id: Uuid, name: &str, added: bool) {
    let payload = WhitelistChangedEvent {
        id,
        name: name.to_owned(),
        action: if added { "added" } else { "removed" }.to_owned(),
    };
    send_admin_event(state, EVENT_WHITELIST_CHANGED, &payload);
}

/// Broadcast a degraded-mode flip to both streams.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let payload = SystemStatus { degraded };
    send_events_event(state, EVENT_SYSTEM_STATUS, &payload);
    send_admin_event(state, EVENT_SYSTEM_STATUS, &payload);
}

fn send_events_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.events_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

fn send_admin_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.admin_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize admin SSE payload"),
    }
}
