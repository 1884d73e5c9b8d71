//! Helpers that serialize domain happenings onto the SSE hubs.

use tracing::warn;

use crate::{
    dao::models::StartFlagEntity,
    dto::{
        format_system_time,
        sse::{RoundSeededEvent, RoundStartedEvent, ServerEvent, SystemStatus, TeamCreatedEvent, TeamJoinedEvent},
        team::TeamSummary,
    },
    state::SharedState,
};
use uuid::Uuid;

fn broadcast_public<T: serde::Serialize>(state: &SharedState, event_name: &str, payload: &T) {
    match ServerEvent::json(Some(event_name.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event = event_name, error = %err, "failed to serialize SSE event"),
    }
}

/// Announce the start of the round to every connected team client.
pub fn broadcast_round_started(state: &SharedState, flag: &StartFlagEntity) {
    broadcast_public(
        state,
        "round_started",
        &RoundStartedEvent {
            started_at: flag.started_at.map(format_system_time),
        },
    );
}

/// Announce that a brand-new round replaced the quiz sequence.
pub fn broadcast_round_seeded(state: &SharedState, length: usize) {
    broadcast_public(state, "round_seeded", &RoundSeededEvent { length });
}

/// Announce a newly registered team.
pub fn broadcast_team_created(state: &SharedState, team: TeamSummary) {
    broadcast_public(state, "team_created", &TeamCreatedEvent { team });
}

/// Announce that an identity joined a team.
pub fn broadcast_team_joined(state: &SharedState, team_id: Uuid) {
    broadcast_public(state, "team_joined", &TeamJoinedEvent { team_id });
}

/// Announce a degraded-mode change on both streams.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    let status = SystemStatus { degraded };
    broadcast_public(state, "system_status", &status);
    if let Ok(event) = ServerEvent::json(Some("system_status".to_string()), &status) {
        state.admin_sse().broadcast(event);
    }
}
