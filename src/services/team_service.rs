//! Team registry: registration, listing, and identity membership.

use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::models::{MembershipEntity, TeamEntity},
    dto::team::{MembershipResponse, RegisterTeamRequest, TeamSummary, TeamsResponse},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Register a new team with a fresh id and persist it.
pub async fn register_team(
    state: &SharedState,
    request: RegisterTeamRequest,
) -> Result<TeamSummary, ServiceError> {
    let name = request.name.trim().to_owned();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "team name must not be empty".into(),
        ));
    }

    let store = state.require_store().await?;
    let entity = TeamEntity {
        id: Uuid::new_v4(),
        name,
        created_at: SystemTime::now(),
    };
    store.save_team(entity.clone()).await?;

    let summary: TeamSummary = entity.into();
    sse_events::broadcast_team_created(state, summary.clone());
    Ok(summary)
}

/// List all registered teams in creation order.
///
/// Reads are eventually consistent relative to concurrent registrations.
pub async fn list_teams(state: &SharedState) -> Result<TeamsResponse, ServiceError> {
    let store = state.require_store().await?;
    let teams = store
        .list_teams()
        .await?
        .into_iter()
        .map(TeamSummary::from)
        .collect();
    Ok(TeamsResponse { teams })
}

/// Upsert the membership of `identity_id` into `team_id`.
///
/// Rejoining the same team is a no-op; joining a different team overwrites the
/// previous membership. Memberships freeze once the round has started.
pub async fn join_team(
    state: &SharedState,
    team_id: Uuid,
    identity_id: Uuid,
) -> Result<MembershipResponse, ServiceError> {
    // The identity must have been issued by this backend.
    state.require_flow(identity_id)?;

    if state.signal().is_started() {
        return Err(ServiceError::InvalidState(
            "team memberships cannot change after the round has started".into(),
        ));
    }

    let store = state.require_store().await?;
    if store.find_team(team_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("team `{team_id}` not found")));
    }

    if let Some(existing) = store.find_membership(identity_id).await?
        && existing.team_id == team_id
    {
        // Idempotent rejoin: leave the stored record untouched.
        return Ok(existing.into());
    }

    let membership = MembershipEntity {
        identity_id,
        team_id,
        updated_at: SystemTime::now(),
    };
    store.save_membership(membership.clone()).await?;

    sse_events::broadcast_team_joined(state, team_id);
    Ok(membership.into())
}

/// Resolve the team an identity currently belongs to.
pub async fn current_membership(
    state: &SharedState,
    identity_id: Uuid,
) -> Result<MembershipResponse, ServiceError> {
    let store = state.require_store().await?;
    let membership = store.find_membership(identity_id).await?.ok_or_else(|| {
        ServiceError::NotFound(format!("identity `{identity_id}` has not joined a team"))
    })?;
    Ok(membership.into())
}

/// Resolve the team id for an identity, failing as a login problem when the
/// identity never joined. Used on the submission path where a missing
/// membership is a precondition failure rather than a lookup miss.
pub async fn require_team_id(
    state: &SharedState,
    identity_id: Uuid,
) -> Result<Uuid, ServiceError> {
    let store = state.require_store().await?;
    let membership = store.find_membership(identity_id).await?.ok_or_else(|| {
        ServiceError::NotLoggedIn(format!("identity `{identity_id}` has not joined a team"))
    })?;
    Ok(membership.team_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::memory::MemoryQuizStore, dao::models::StartFlagEntity, state::AppState};
    use std::sync::Arc;

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryQuizStore::new())).await;
        state
    }

    fn register_request(name: &str) -> RegisterTeamRequest {
        RegisterTeamRequest { name: name.into() }
    }

    #[tokio::test]
    async fn register_rejects_blank_names() {
        let state = test_state().await;
        let err = register_team(&state, register_request("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn teams_are_listed_in_creation_order() {
        let state = test_state().await;
        register_team(&state, register_request("alpha")).await.unwrap();
        register_team(&state, register_request("beta")).await.unwrap();
        register_team(&state, register_request("gamma")).await.unwrap();

        let listed = list_teams(&state).await.unwrap();
        let names: Vec<_> = listed.teams.iter().map(|team| team.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn rejoining_the_same_team_is_idempotent() {
        let state = test_state().await;
        let team = register_team(&state, register_request("alpha")).await.unwrap();
        let identity_id = state.register_identity();

        let first = join_team(&state, team.id, identity_id).await.unwrap();
        let second = join_team(&state, team.id, identity_id).await.unwrap();

        assert_eq!(first.team_id, second.team_id);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn joining_a_different_team_overwrites_membership() {
        let state = test_state().await;
        let alpha = register_team(&state, register_request("alpha")).await.unwrap();
        let beta = register_team(&state, register_request("beta")).await.unwrap();
        let identity_id = state.register_identity();

        join_team(&state, alpha.id, identity_id).await.unwrap();
        join_team(&state, beta.id, identity_id).await.unwrap();

        let membership = current_membership(&state, identity_id).await.unwrap();
        assert_eq!(membership.team_id, beta.id);
    }

    #[tokio::test]
    async fn joining_an_unknown_team_fails() {
        let state = test_state().await;
        let identity_id = state.register_identity();
        let err = join_team(&state, Uuid::new_v4(), identity_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn memberships_freeze_once_started() {
        let state = test_state().await;
        let team = register_team(&state, register_request("alpha")).await.unwrap();
        let identity_id = state.register_identity();

        state.signal().mark_started(StartFlagEntity::started_now());
        let err = join_team(&state, team.id, identity_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn membership_lookup_without_join_is_not_found() {
        let state = test_state().await;
        let identity_id = state.register_identity();
        let err = current_membership(&state, identity_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
