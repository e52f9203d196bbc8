use std::collections::BTreeSet;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::state::machine::MaintenancePhase;
use crate::state::settings::TimerKind;

/// Inclusive bounds accepted for a countdown, in minutes (28 days max).
pub const MIN_TIMER_MINUTES: u64 = 1;
/// Upper bound for a countdown.
pub const MAX_TIMER_MINUTES: u64 = 40_320;

/// What a single tick did to the active countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A configured remaining-minutes mark was hit; broadcast a warning.
    Warn(u64),
    /// The countdown reached zero; apply the target state.
    Finished,
    /// Nothing to report this minute.
    Continue,
}

/// The single scheduled state transition. Created with one extra minute so
/// the immediate first tick of the driver brings `remaining_minutes` back to
/// the requested count and fires any warning configured for it.
#[derive(Debug, Clone)]
pub struct TimerTask {
    target: MaintenancePhase,
    remaining_minutes: u64,
    pending_intervals: BTreeSet<u64>,
}

impl TimerTask {
    /// Build a countdown of `minutes` towards `target`, with a private copy
    /// of the configured warning marks.
    pub fn new(target: MaintenancePhase, minutes: u64, intervals: BTreeSet<u64>) -> Self {
        Self {
            target,
            remaining_minutes: minutes + 1,
            pending_intervals: intervals,
        }
    }

    /// Phase applied when the countdown elapses.
    pub fn target(&self) -> MaintenancePhase {
        self.target
    }

    /// Which warning template this countdown broadcasts with.
    pub fn kind(&self) -> TimerKind {
        match self.target {
            MaintenancePhase::Maintenance => TimerKind::Start,
            MaintenancePhase::Normal => TimerKind::End,
        }
    }

    /// Minutes left until the transition fires.
    pub fn remaining_minutes(&self) -> u64 {
        self.remaining_minutes
    }

    /// Advance the countdown by one minute. Each warning mark is consumed
    /// when it fires, so a mark broadcasts at most once per task.
    pub fn tick(&mut self) -> TickOutcome {
        self.remaining_minutes = self.remaining_minutes.saturating_sub(1);
        if self.pending_intervals.remove(&self.remaining_minutes) && self.remaining_minutes > 0 {
            return TickOutcome::Warn(self.remaining_minutes);
        }
        if self.remaining_minutes == 0 {
            return TickOutcome::Finished;
        }
        TickOutcome::Continue
    }
}

/// A live countdown: the task plus the spawned driver advancing it.
pub struct ActiveCountdown {
    /// Countdown state mutated once per tick.
    pub task: TimerTask,
    /// Handle of the tokio task driving the ticks; aborted on cancel.
    pub driver: JoinHandle<()>,
}

/// Owner of the at-most-one active countdown. Tick processing and
/// cancellation serialize on the slot mutex, which is what makes
/// cancellation win races against an in-flight tick.
pub struct TimerState {
    slot: Mutex<Option<ActiveCountdown>>,
}

impl TimerState {
    /// Empty scheduler state.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The guarded countdown slot.
    pub fn slot(&self) -> &Mutex<Option<ActiveCountdown>> {
        &self.slot
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcomes(mut task: TimerTask, ticks: usize) -> Vec<TickOutcome> {
        (0..ticks).map(|_| task.tick()).collect()
    }

    #[test]
    fn five_minute_countdown_with_two_marks() {
        let task = TimerTask::new(
            MaintenancePhase::Normal,
            5,
            BTreeSet::from([1, 5]),
        );

        assert_eq!(
            outcomes(task, 6),
            vec![
                TickOutcome::Warn(5),
                TickOutcome::Continue,
                TickOutcome::Continue,
                TickOutcome::Continue,
                TickOutcome::Warn(1),
                TickOutcome::Finished,
            ]
        );
    }

    #[test]
    fn marks_beyond_the_duration_never_fire() {
        let task = TimerTask::new(MaintenancePhase::Maintenance, 3, BTreeSet::from([5]));
        assert!(
            outcomes(task, 4)
                .iter()
                .all(|outcome| !matches!(outcome, TickOutcome::Warn(_)))
        );
    }

    #[test]
    fn each_mark_fires_at_most_once() {
        let mut task = TimerTask::new(MaintenancePhase::Maintenance, 2, BTreeSet::from([2]));
        assert_eq!(task.tick(), TickOutcome::Warn(2));
        assert_eq!(task.tick(), TickOutcome::Continue);
        assert_eq!(task.tick(), TickOutcome::Finished);
    }

    #[test]
    fn kind_follows_the_target_phase() {
        let start = TimerTask::new(MaintenancePhase::Maintenance, 1, BTreeSet::new());
        let end = TimerTask::new(MaintenancePhase::Normal, 1, BTreeSet::new());
        assert_eq!(start.kind(), TimerKind::Start);
        assert_eq!(end.kind(), TimerKind::End);
    }
}
