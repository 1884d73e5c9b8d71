//! Client-visible flow snapshots.

use serde::Serialize;
use utoipa::ToSchema;

use crate::state::flow::{FlowPhase, Snapshot};

/// Client-visible phase of a team's flow through the round.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum VisibleFlowPhase {
    /// Waiting for the start signal.
    Lobby,
    /// Start observed; resolving membership and the first quiz.
    Starting,
    /// Viewing the quiz at `index`.
    Answering {
        /// Position of the quiz being answered.
        index: u32,
    },
    /// A submission for `index` is in flight.
    Advancing {
        /// Position of the quiz being recorded.
        index: u32,
    },
    /// All quizzes answered; waiting for results.
    ResultsWait,
}

impl From<FlowPhase> for VisibleFlowPhase {
    fn from(value: FlowPhase) -> Self {
        match value {
            FlowPhase::Lobby => VisibleFlowPhase::Lobby,
            FlowPhase::Starting => VisibleFlowPhase::Starting,
            FlowPhase::Answering(index) => VisibleFlowPhase::Answering { index },
            FlowPhase::Advancing(index) => VisibleFlowPhase::Advancing { index },
            FlowPhase::ResultsWait => VisibleFlowPhase::ResultsWait,
        }
    }
}

/// Snapshot of one client flow exposed for diagnostics and UI recovery.
#[derive(Debug, Serialize, ToSchema)]
pub struct FlowSnapshotResponse {
    /// Current phase of the flow.
    pub current: VisibleFlowPhase,
    /// Target phase of a transition that is planned but not yet applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<VisibleFlowPhase>,
}

impl From<Snapshot> for FlowSnapshotResponse {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            current: snapshot.phase.into(),
            pending: snapshot.pending.map(Into::into),
        }
    }
}
