//! Per-client flow state machine with planned transitions.

use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// Phases a single client (team device) moves through during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    /// Waiting in the lobby for the administrator to start the round.
    Lobby,
    /// Transient: start signal observed, resolving membership and first quiz.
    Starting,
    /// Viewing the quiz at the given sequence index.
    Answering(u32),
    /// Transient: an answer for the given index is being recorded.
    Advancing(u32),
    /// All quizzes answered; waiting for result collation.
    ResultsWait,
}

/// Events that can be applied to a client flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    /// The shared start signal fired (or was already set) for this client.
    SignalFired,
    /// The quiz at the given index was resolved during startup.
    QuizResolved {
        /// Index the client enters the round at (0, or a resumed position).
        index: u32,
    },
    /// The client navigated to an explicit index; position is re-derived
    /// from the parameter, never from prior flow state.
    Resume {
        /// Index carried by the navigation parameter.
        index: u32,
    },
    /// The client confirmed its buffered selection for the current quiz.
    Confirm,
    /// The recorded answer moves the client forward.
    Advance {
        /// Whether the answered quiz was the last of the sequence.
        last: bool,
    },
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the flow was in when the invalid event was received.
    pub from: FlowPhase,
    /// The event that cannot be applied from this phase.
    pub event: FlowEvent,
}

/// Errors that can occur when planning a flow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned flow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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
    /// Flow phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when the plan was created.
        expected: FlowPhase,
        /// Current phase.
        actual: FlowPhase,
    },
    /// Flow version changed since the plan was created.
    VersionMismatch {
        /// Version when the plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned flow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

/// Unique identifier for a planned flow transition.
pub type PlanId = Uuid;

/// A planned flow transition that has been validated but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the flow is currently in.
    pub from: FlowPhase,
    /// Phase the flow will transition to.
    pub to: FlowPhase,
    /// Event that triggered this transition.
    pub event: FlowEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of one client flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the flow.
    pub phase: FlowPhase,
    /// Version number (increments on each applied transition).
    pub version: usize,
    /// Pending transition target, if a transition is planned but not applied.
    pub pending: Option<FlowPhase>,
}

/// Per-client state machine driving a team's progression through the round.
///
/// A submission is never observable half-done: the ledger write runs between
/// [`FlowStateMachine::plan`] and [`FlowStateMachine::apply`], and an aborted
/// plan leaves the phase exactly where it was.
#[derive(Debug, Clone)]
pub struct FlowStateMachine {
    phase: FlowPhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for FlowStateMachine {
    fn default() -> Self {
        Self {
            phase: FlowPhase::Lobby,
            version: 0,
            pending: None,
        }
    }
}

impl FlowStateMachine {
    /// Create a new flow initialised in the lobby.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    /// Create a snapshot of the current flow state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the
    /// current phase. Returns a plan that can later be applied or aborted.
    pub fn plan(&mut self, event: FlowEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan);

        Ok(plan)
    }

    /// Apply a planned transition, moving the flow to the next phase.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<FlowPhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;
        self.pending = None;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it; the flow stays in its
    /// prior phase.
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

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: FlowEvent) -> Result<FlowPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (FlowPhase::Lobby, FlowEvent::SignalFired) => FlowPhase::Starting,
            (FlowPhase::Starting, FlowEvent::QuizResolved { index }) => {
                FlowPhase::Answering(index)
            }
            // An explicit navigation parameter always wins over remembered
            // position, so a reload re-derives the same quiz.
            (FlowPhase::Answering(_), FlowEvent::Resume { index }) => FlowPhase::Answering(index),
            (FlowPhase::Answering(index), FlowEvent::Confirm) => FlowPhase::Advancing(index),
            (FlowPhase::Advancing(index), FlowEvent::Advance { last: false }) => {
                FlowPhase::Answering(index + 1)
            }
            (FlowPhase::Advancing(_), FlowEvent::Advance { last: true }) => FlowPhase::ResultsWait,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut FlowStateMachine, event: FlowEvent) -> FlowPhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    fn answering_flow(index: u32) -> FlowStateMachine {
        let mut sm = FlowStateMachine::new();
        apply(&mut sm, FlowEvent::SignalFired);
        apply(&mut sm, FlowEvent::QuizResolved { index });
        sm
    }

    #[test]
    fn initial_state_is_lobby() {
        let sm = FlowStateMachine::new();
        assert_eq!(sm.phase(), FlowPhase::Lobby);
    }

    #[test]
    fn full_round_with_three_quizzes() {
        let mut sm = FlowStateMachine::new();

        assert_eq!(apply(&mut sm, FlowEvent::SignalFired), FlowPhase::Starting);
        assert_eq!(
            apply(&mut sm, FlowEvent::QuizResolved { index: 0 }),
            FlowPhase::Answering(0)
        );

        for index in 0..2 {
            assert_eq!(
                apply(&mut sm, FlowEvent::Confirm),
                FlowPhase::Advancing(index)
            );
            assert_eq!(
                apply(&mut sm, FlowEvent::Advance { last: false }),
                FlowPhase::Answering(index + 1)
            );
        }

        assert_eq!(apply(&mut sm, FlowEvent::Confirm), FlowPhase::Advancing(2));
        assert_eq!(
            apply(&mut sm, FlowEvent::Advance { last: true }),
            FlowPhase::ResultsWait
        );
    }

    #[test]
    fn resume_follows_the_parameter_not_prior_state() {
        let mut sm = answering_flow(0);
        assert_eq!(
            apply(&mut sm, FlowEvent::Resume { index: 2 }),
            FlowPhase::Answering(2)
        );
        assert_eq!(
            apply(&mut sm, FlowEvent::Resume { index: 2 }),
            FlowPhase::Answering(2)
        );
    }

    #[test]
    fn confirm_while_pending_is_rejected() {
        let mut sm = answering_flow(0);
        let _plan = sm.plan(FlowEvent::Confirm).unwrap();
        assert_eq!(sm.plan(FlowEvent::Confirm), Err(PlanError::AlreadyPending));
    }

    #[test]
    fn aborted_confirm_leaves_phase_unchanged() {
        let mut sm = answering_flow(1);
        let plan = sm.plan(FlowEvent::Confirm).unwrap();
        sm.abort(plan.id).unwrap();
        assert_eq!(sm.phase(), FlowPhase::Answering(1));
        assert_eq!(sm.snapshot().pending, None);
    }

    #[test]
    fn results_wait_is_terminal() {
        let mut sm = answering_flow(0);
        apply(&mut sm, FlowEvent::Confirm);
        apply(&mut sm, FlowEvent::Advance { last: true });

        let err = sm.plan(FlowEvent::Resume { index: 0 }).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, FlowPhase::ResultsWait);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn signal_cannot_fire_twice() {
        let mut sm = FlowStateMachine::new();
        apply(&mut sm, FlowEvent::SignalFired);
        let err = sm.plan(FlowEvent::SignalFired).unwrap_err();
        assert!(matches!(err, PlanError::InvalidTransition(_)));
    }
}
