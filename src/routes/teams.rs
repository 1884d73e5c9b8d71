//! Team registration and membership endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        quiz::IdentityParams,
        team::{JoinTeamRequest, MembershipResponse, RegisterTeamRequest, TeamSummary, TeamsResponse},
    },
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Routes handling team registration and membership.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", post(register_team).get(list_teams))
        .route("/teams/{id}/join", post(join_team))
        .route("/teams/membership", get(current_membership))
}

/// Register a new team.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = RegisterTeamRequest,
    responses(
        (status = 200, description = "Team registered", body = TeamSummary),
        (status = 400, description = "Blank team name")
    )
)]
pub async fn register_team(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterTeamRequest>,
) -> Result<Json<TeamSummary>, AppError> {
    payload.validate()?;
    let summary = team_service::register_team(&state, payload).await?;
    Ok(Json(summary))
}

/// List registered teams in creation order.
#[utoipa::path(
    get,
    path = "/teams",
    tag = "teams",
    responses((status = 200, description = "Registered teams", body = TeamsResponse))
)]
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<TeamsResponse>, AppError> {
    Ok(Json(team_service::list_teams(&state).await?))
}

/// Join (or re-join) a team with a session identity.
#[utoipa::path(
    post,
    path = "/teams/{id}/join",
    tag = "teams",
    params(("id" = String, Path, description = "Identifier of the team to join")),
    request_body = JoinTeamRequest,
    responses(
        (status = 200, description = "Membership recorded", body = MembershipResponse),
        (status = 404, description = "Unknown team"),
        (status = 409, description = "Round already started; memberships are frozen")
    )
)]
pub async fn join_team(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<JoinTeamRequest>,
) -> Result<Json<MembershipResponse>, AppError> {
    let membership = team_service::join_team(&state, id, payload.identity_id).await?;
    Ok(Json(membership))
}

/// Look up which team an identity currently belongs to.
#[utoipa::path(
    get,
    path = "/teams/membership",
    tag = "teams",
    params(IdentityParams),
    responses(
        (status = 200, description = "Current membership", body = MembershipResponse),
        (status = 404, description = "Identity has not joined a team")
    )
)]
pub async fn current_membership(
    State(state): State<SharedState>,
    Query(params): Query<IdentityParams>,
) -> Result<Json<MembershipResponse>, AppError> {
    let identity_id = params
        .identity_id
        .ok_or_else(|| AppError::BadRequest("missing parameter `identity_id`".into()))?;
    let membership = team_service::current_membership(&state, identity_id).await?;
    Ok(Json(membership))
}
