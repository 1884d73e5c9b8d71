//! Entities shared between the store backends and the services.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Representation of a team stored in persistence and shared across layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name chosen at registration. Never empty.
    pub name: String,
    /// Creation timestamp; team listings preserve creation order.
    pub created_at: SystemTime,
}

/// Mapping from a session identity to the team it currently belongs to.
///
/// Keyed by `identity_id`: one identity maps to at most one team at a time,
/// and saving again overwrites the previous membership.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipEntity {
    /// Opaque per-session identity the membership belongs to.
    pub identity_id: Uuid,
    /// Team the identity joined.
    pub team_id: Uuid,
    /// Last time the membership was (re)assigned.
    pub updated_at: SystemTime,
}

/// A single quiz question persisted as part of the round sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizEntity {
    /// Stable identifier for the quiz.
    pub id: Uuid,
    /// Zero-based position inside the round sequence. Fixed for the round.
    pub position: u32,
    /// Question text shown to teams.
    pub question: String,
    /// Ordered answer options. At least two entries, immutable during play.
    pub options: Vec<String>,
}

/// Shared start flag document for the current round.
///
/// Monotonic within a round: once `started` is true it never reverts. A
/// brand-new round (reseeding the quiz sequence) writes a fresh flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StartFlagEntity {
    /// Whether the administrator has started the round.
    pub started: bool,
    /// Server timestamp of the start action, when started.
    pub started_at: Option<SystemTime>,
}

impl StartFlagEntity {
    /// Flag value representing a started round, stamped now.
    pub fn started_now() -> Self {
        Self {
            started: true,
            started_at: Some(SystemTime::now()),
        }
    }
}

/// A recorded answer, at most one per `(quiz_id, team_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Quiz the answer refers to.
    pub quiz_id: Uuid,
    /// Team the answer is recorded for.
    pub team_id: Uuid,
    /// Identity that performed the submission, for attribution only.
    pub identity_id: Uuid,
    /// Index of the selected option within the quiz options.
    pub option_index: u32,
    /// Server-assigned submission timestamp.
    pub submitted_at: SystemTime,
}

impl AnswerEntity {
    /// Build an answer stamped with the current server time.
    pub fn new(quiz_id: Uuid, team_id: Uuid, identity_id: Uuid, option_index: u32) -> Self {
        Self {
            quiz_id,
            team_id,
            identity_id,
            option_index,
            submitted_at: SystemTime::now(),
        }
    }
}

/// Outcome of an answer insertion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerInsert {
    /// The answer was recorded; no prior answer existed for the pair.
    Created,
    /// An answer already existed for the `(quiz, team)` pair; nothing written.
    Duplicate,
}
