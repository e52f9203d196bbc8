use std::time::Duration;

use tracing::{info, warn};

use crate::{
    dto::timer::{CancelTimerResponse, TimerStatus},
    error::ServiceError,
    state::{
        SharedState,
        machine::MaintenancePhase,
        timer::{
            ActiveCountdown, MAX_TIMER_MINUTES, MIN_TIMER_MINUTES, TickOutcome, TimerTask,
        },
    },
};

use super::{maintenance_service, session_service, sse_events};

const TICK_PERIOD: Duration = Duration::from_secs(60);

/// Schedule a countdown towards maintenance. The service stays open until
/// the countdown elapses.
pub async fn start_timer(state: &SharedState, minutes: u64) -> Result<TimerStatus, ServiceError> {
    let _gate = state.mutation_gate().lock().await;
    validate_minutes(minutes)?;
    schedule_locked(state, MaintenancePhase::Maintenance, minutes).await
}

/// Schedule a countdown towards reopening. Maintenance turns on immediately
/// at schedule time so the service is gated for the whole countdown; this
/// asymmetry with [`start_timer`] is deliberate.
pub async fn end_timer(state: &SharedState, minutes: u64) -> Result<TimerStatus, ServiceError> {
    let _gate = state.mutation_gate().lock().await;
    validate_minutes(minutes)?;

    // Check for a conflicting countdown before touching any state, so a
    // rejected request leaves the flag alone too.
    if state.timer().slot().lock().await.is_some() {
        return Err(ServiceError::TimerConflict);
    }

    maintenance_service::set_maintenance_locked(state, true).await?;
    schedule_locked(state, MaintenancePhase::Normal, minutes).await
}

/// Cancel the active countdown. Cancelling when none is active is a no-op
/// reported through the response, not an error.
pub async fn cancel(state: &SharedState) -> CancelTimerResponse {
    let _gate = state.mutation_gate().lock().await;
    match clear_active(state).await {
        Some(remaining) => {
            info!(remaining, "timer cancelled");
            sse_events::broadcast_timer_cancelled(state, remaining);
            CancelTimerResponse {
                cancelled: true,
                remaining_minutes: Some(remaining),
            }
        }
        None => CancelTimerResponse {
            cancelled: false,
            remaining_minutes: None,
        },
    }
}

/// Snapshot of the scheduler.
pub async fn status(state: &SharedState) -> TimerStatus {
    let slot = state.timer().slot().lock().await;
    match slot.as_ref() {
        Some(active) => TimerStatus::running(
            active.task.remaining_minutes(),
            active.task.target().as_flag(),
        ),
        None => TimerStatus::idle(),
    }
}

/// Take down the active countdown, returning the minutes it still had.
/// Callers must hold the mutation gate.
pub(crate) async fn clear_active(state: &SharedState) -> Option<u64> {
    let mut slot = state.timer().slot().lock().await;
    let active = slot.take()?;
    active.driver.abort();
    Some(active.task.remaining_minutes())
}

async fn schedule_locked(
    state: &SharedState,
    target: MaintenancePhase,
    minutes: u64,
) -> Result<TimerStatus, ServiceError> {
    let mut slot = state.timer().slot().lock().await;
    if slot.is_some() {
        return Err(ServiceError::TimerConflict);
    }

    let intervals = state.settings().read().await.broadcast_intervals().clone();
    let task = TimerTask::new(target, minutes, intervals);
    let driver = tokio::spawn(run_driver(state.clone()));
    *slot = Some(ActiveCountdown { task, driver });
    drop(slot);

    info!(
        minutes,
        maintenance = target.as_flag(),
        "timer started"
    );
    Ok(TimerStatus::running(minutes, target.as_flag()))
}

fn validate_minutes(minutes: u64) -> Result<(), ServiceError> {
    if !(MIN_TIMER_MINUTES..=MAX_TIMER_MINUTES).contains(&minutes) {
        return Err(ServiceError::InvalidInput(format!(
            "minutes must be between {MIN_TIMER_MINUTES} and {MAX_TIMER_MINUTES} (28 days)"
        )));
    }
    Ok(())
}

/// Drive one tick per minute. The interval fires immediately, which brings
/// the freshly created task from `minutes + 1` back down to `minutes` and
/// fires any warning configured for that mark.
async fn run_driver(state: SharedState) {
    let mut ticker = tokio::time::interval(TICK_PERIOD);
    loop {
        ticker.tick().await;
        if !run_tick(&state).await {
            break;
        }
    }
}

/// Process a single tick. Returns whether the driver should keep running.
///
/// Ticks take the mutation gate before the countdown slot, the same order
/// as cancellation. A cancel that wins the gate removes the task and this
/// tick finds an empty slot; a zero-reaching tick that wins completes its
/// transition before the cancel can observe anything half-done.
pub(crate) async fn run_tick(state: &SharedState) -> bool {
    let _gate = state.mutation_gate().lock().await;

    let mut slot = state.timer().slot().lock().await;
    let Some(active) = slot.as_mut() else {
        // Cancelled while this tick was waiting its turn.
        return false;
    };

    match active.task.tick() {
        TickOutcome::Continue => true,
        TickOutcome::Warn(remaining) => {
            let kind = active.task.kind();
            drop(slot);

            let message = state.settings().read().await.timer_warning(kind, remaining);
            session_service::broadcast_to_sessions(state, &message);
            sse_events::broadcast_timer_warning(state, remaining, &message);
            true
        }
        TickOutcome::Finished => {
            // Self-cancel before applying the transition so the transition's
            // own timer cleanup finds an empty slot instead of this driver.
            let target = slot.take().map(|active| active.task.target());
            drop(slot);

            let Some(target) = target else {
                return false;
            };
            match maintenance_service::set_maintenance_locked(state, target.as_flag()).await {
                Ok(_) => sse_events::broadcast_timer_ended(state, target.as_flag()),
                Err(err) => {
                    warn!(error = %err, "scheduled transition failed; timer dropped")
                }
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{insert_session, test_state};

    #[tokio::test]
    async fn minutes_outside_bounds_are_rejected() {
        let state = test_state().await;

        for minutes in [0, 40_321] {
            let err = start_timer(&state, minutes).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
            let err = end_timer(&state, minutes).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidInput(_)));
        }
        assert!(state.timer().slot().lock().await.is_none());
        assert!(!state.phase().await.as_flag());

        let status = start_timer(&state, 40_320).await.unwrap();
        assert_eq!(status.remaining_minutes, Some(40_320));
        assert!(cancel(&state).await.cancelled);

        let status = start_timer(&state, 1).await.unwrap();
        assert_eq!(status.remaining_minutes, Some(1));
        assert!(cancel(&state).await.cancelled);
    }

    #[tokio::test]
    async fn second_countdown_conflicts_and_preserves_the_first() {
        let state = test_state().await;
        start_timer(&state, 100).await.unwrap();
        // Let the driver's immediate first tick land.
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(matches!(
            start_timer(&state, 5).await.unwrap_err(),
            ServiceError::TimerConflict
        ));
        assert!(matches!(
            end_timer(&state, 5).await.unwrap_err(),
            ServiceError::TimerConflict
        ));
        // The rejected end timer must not have flipped the flag either.
        assert!(!state.phase().await.as_flag());

        let snapshot = status(&state).await;
        assert_eq!(snapshot.remaining_minutes, Some(100));
    }

    #[tokio::test]
    async fn cancel_is_a_reported_noop_when_idle() {
        let state = test_state().await;
        let response = cancel(&state).await;
        assert!(!response.cancelled);
        assert!(response.remaining_minutes.is_none());

        start_timer(&state, 10).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let response = cancel(&state).await;
        assert!(response.cancelled);
        assert_eq!(response.remaining_minutes, Some(10));
        assert!(state.timer().slot().lock().await.is_none());
        // State untouched by the aborted countdown.
        assert!(!state.phase().await.as_flag());
    }

    #[tokio::test]
    async fn end_timer_gates_the_service_immediately() {
        let state = test_state().await;
        let (gated_id, _rx) = insert_session(&state, false);

        end_timer(&state, 30).await.unwrap();
        assert!(state.phase().await.as_flag());
        assert!(!state.sessions().contains_key(&gated_id));

        let snapshot = status(&state).await;
        assert!(snapshot.active);
        assert_eq!(snapshot.target_maintenance, Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_completes_with_warnings_and_one_terminal_transition() {
        let state = test_state().await;
        let mut events = state.events_sse().subscribe();

        start_timer(&state, 3).await.unwrap();
        // Three minutes of virtual time plus slack; tokio auto-advances.
        tokio::time::sleep(Duration::from_secs(200)).await;

        // The terminal transition persists through real file I/O, so switch
        // back to real time and give it a moment to land.
        tokio::time::resume();
        for _ in 0..100 {
            if state.phase().await.as_flag() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(state.phase().await.as_flag());
        assert!(state.timer().slot().lock().await.is_none());

        let mut warnings = 0;
        let mut ended = 0;
        let mut changed = 0;
        while let Ok(event) = events.try_recv() {
            match event.event.as_deref() {
                Some("timer.warning") => warnings += 1,
                Some("timer.ended") => ended += 1,
                Some("maintenance.changed") => changed += 1,
                _ => {}
            }
        }
        // Default marks include 1, 2, and 3 minutes.
        assert_eq!(warnings, 3);
        assert_eq!(ended, 1);
        assert_eq!(changed, 1);
    }
}
