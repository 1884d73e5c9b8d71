//! SSE event payloads.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::team::TeamSummary;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized SSE data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Plain-text event without JSON serialization.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
///
/// Carrying `started` here closes the missed-event window: a client that
/// subscribes after the round began learns it from the handshake instead of
/// waiting for an event that already fired.
pub struct Handshake {
    /// Identifier of the SSE stream (`public` or `admin`).
    pub stream: String,
    /// Whether the round has already been started.
    pub started: bool,
    /// Whether the backend is running without a store connection.
    pub degraded: bool,
    /// Optional admin token returned when the stream is privileged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once when the administrator starts the round.
pub struct RoundStartedEvent {
    /// RFC 3339 timestamp of the start action.
    pub started_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a brand-new round replaces the quiz sequence.
pub struct RoundSeededEvent {
    /// Number of quizzes in the new sequence.
    pub length: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a new team registers.
pub struct TeamCreatedEvent {
    /// The newly registered team.
    pub team: TeamSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an identity joins a team; lets lobby screens show counts.
pub struct TeamJoinedEvent {
    /// Team that gained a member.
    pub team_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    /// Current degraded flag.
    pub degraded: bool,
}
