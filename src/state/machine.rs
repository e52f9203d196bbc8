use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// The two service states. `Maintenance` gates new sessions behind the
/// whitelist and the bypass capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenancePhase {
    /// Normal operation, everyone may connect.
    Normal,
    /// Gated operation, only exempt identities may connect.
    Maintenance,
}

impl MaintenancePhase {
    /// Map the persisted boolean flag onto a phase.
    pub fn from_flag(maintenance: bool) -> Self {
        if maintenance {
            Self::Maintenance
        } else {
            Self::Normal
        }
    }

    /// The persisted boolean form of this phase.
    pub fn as_flag(self) -> bool {
        matches!(self, Self::Maintenance)
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceEvent {
    /// Gate the service.
    Activate,
    /// Reopen the service.
    Deactivate,
}

impl MaintenanceEvent {
    /// Event that moves the machine towards the given target phase.
    pub fn towards(target: MaintenancePhase) -> Self {
        match target {
            MaintenancePhase::Maintenance => Self::Activate,
            MaintenancePhase::Normal => Self::Deactivate,
        }
    }
}

/// Error returned when attempting to apply an event that does not change
/// the phase. Idempotent requests are handled above the machine, so by the
/// time an event reaches it, same-state events are a caller bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in when the event was received.
    pub from: MaintenancePhase,
    /// The rejected event.
    pub event: MaintenanceEvent,
}

/// Errors that can occur when planning a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The event does not change the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Errors that can occur when aborting a planned transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned transition.
pub type PlanId = Uuid;

/// A transition that has been validated but not yet applied. The flag is
/// persisted between plan and apply, so a failed write aborts the plan and
/// leaves the phase untouched.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the machine is currently in.
    pub from: MaintenancePhase,
    /// Phase the machine will move to.
    pub to: MaintenancePhase,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Two-state machine guarding the maintenance flag. Every flag change in
/// the process goes through plan/apply on this machine.
#[derive(Debug, Clone)]
pub struct MaintenanceStateMachine {
    phase: MaintenancePhase,
    pending: Option<Plan>,
}

impl MaintenanceStateMachine {
    /// Create a machine starting from the persisted flag.
    pub fn new(phase: MaintenancePhase) -> Self {
        Self {
            phase,
            pending: None,
        }
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> MaintenancePhase {
        self.phase
    }

    /// Plan a transition, validating that the event actually changes the
    /// phase and that no other plan is in flight.
    pub fn plan(&mut self, event: MaintenanceEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let to = match (self.phase, event) {
            (MaintenancePhase::Normal, MaintenanceEvent::Activate) => MaintenancePhase::Maintenance,
            (MaintenancePhase::Maintenance, MaintenanceEvent::Deactivate) => {
                MaintenancePhase::Normal
            }
            (from, event) => {
                return Err(PlanError::InvalidTransition(InvalidTransition {
                    from,
                    event,
                }));
            }
        };

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to,
            pending_since: Instant::now(),
        };
        self.pending = Some(plan.clone());
        Ok(plan)
    }

    /// Apply a planned transition, returning the new phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<MaintenancePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        self.phase = plan.to;
        Ok(self.phase)
    }

    /// Overwrite the phase after an external reload, without transition
    /// side effects. Fails while a planned transition is pending.
    pub fn resync(&mut self, phase: MaintenancePhase) -> Result<(), PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }
        self.phase = phase;
        Ok(())
    }

    /// Abort a planned transition without applying it.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut MaintenanceStateMachine, event: MaintenanceEvent) -> MaintenancePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn toggles_between_phases() {
        let mut sm = MaintenanceStateMachine::new(MaintenancePhase::Normal);
        assert_eq!(
            apply(&mut sm, MaintenanceEvent::Activate),
            MaintenancePhase::Maintenance
        );
        assert_eq!(
            apply(&mut sm, MaintenanceEvent::Deactivate),
            MaintenancePhase::Normal
        );
    }

    #[test]
    fn same_state_event_is_rejected() {
        let mut sm = MaintenanceStateMachine::new(MaintenancePhase::Normal);
        match sm.plan(MaintenanceEvent::Deactivate).unwrap_err() {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, MaintenancePhase::Normal);
                assert_eq!(invalid.event, MaintenanceEvent::Deactivate);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn planning_twice_requires_resolution_first() {
        let mut sm = MaintenanceStateMachine::new(MaintenancePhase::Normal);
        let plan = sm.plan(MaintenanceEvent::Activate).unwrap();
        assert_eq!(
            sm.plan(MaintenanceEvent::Activate).unwrap_err(),
            PlanError::AlreadyPending
        );

        sm.abort(plan.id).unwrap();
        assert_eq!(sm.phase(), MaintenancePhase::Normal);
        assert!(sm.plan(MaintenanceEvent::Activate).is_ok());
    }

    #[test]
    fn abort_leaves_phase_untouched() {
        let mut sm = MaintenanceStateMachine::new(MaintenancePhase::Maintenance);
        let plan = sm.plan(MaintenanceEvent::Deactivate).unwrap();
        sm.abort(plan.id).unwrap();
        assert_eq!(sm.phase(), MaintenancePhase::Maintenance);
    }

    #[test]
    fn apply_with_wrong_id_keeps_plan_pending() {
        let mut sm = MaintenanceStateMachine::new(MaintenancePhase::Normal);
        let plan = sm.plan(MaintenanceEvent::Activate).unwrap();

        let got = Uuid::new_v4();
        match sm.apply(got).unwrap_err() {
            ApplyError::IdMismatch { expected, .. } => assert_eq!(expected, plan.id),
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(sm.apply(plan.id).unwrap(), MaintenancePhase::Maintenance);
    }
}
