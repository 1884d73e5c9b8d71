//! Team registration and membership payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MembershipEntity, TeamEntity},
    dto::{format_system_time, validation::validate_display_name},
};

/// Payload used to register a new team before the round starts.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterTeamRequest {
    /// Display name of the team. Must not be blank.
    #[validate(custom(function = validate_display_name))]
    pub name: String,
}

/// Payload for an identity joining (or re-joining) a team.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinTeamRequest {
    /// Session identity performing the join.
    pub identity_id: Uuid,
}

/// Projection of a team shared with clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamSummary {
    /// Stable identifier for the team.
    pub id: Uuid,
    /// Display name of the team.
    pub name: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<TeamEntity> for TeamSummary {
    fn from(entity: TeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            created_at: format_system_time(entity.created_at),
        }
    }
}

/// Response payload listing all registered teams in creation order.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsResponse {
    /// Registered teams, oldest first.
    pub teams: Vec<TeamSummary>,
}

/// Response describing which team an identity currently belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct MembershipResponse {
    /// The identity the membership belongs to.
    pub identity_id: Uuid,
    /// The team the identity joined.
    pub team_id: Uuid,
    /// RFC 3339 timestamp of the last (re)assignment.
    pub updated_at: String,
}

impl From<MembershipEntity> for MembershipResponse {
    fn from(entity: MembershipEntity) -> Self {
        Self {
            identity_id: entity.identity_id,
            team_id: entity.team_id,
            updated_at: format_system_time(entity.updated_at),
        }
    }
}
