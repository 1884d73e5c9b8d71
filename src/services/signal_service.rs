//! Admin start signal for the active round.

use tracing::info;

use crate::{
    dao::models::StartFlagEntity,
    dto::{admin::StartRoundResponse, format_system_time},
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Set the shared start flag and propagate it to every connected client.
///
/// The flag is monotonic within a round: a second call is a no-op that
/// reports the original start timestamp instead of overwriting it.
pub async fn start_round(state: &SharedState) -> Result<StartRoundResponse, ServiceError> {
    state.require_round().await?;

    let current = state.signal().current();
    if current.started {
        return Ok(StartRoundResponse {
            started: true,
            started_at: current.started_at.map(format_system_time),
            already_started: true,
        });
    }

    let flag = StartFlagEntity::started_now();
    let store = state.require_store().await?;
    store.write_start_flag(flag.clone()).await?;
    state.signal().mark_started(flag.clone());

    info!("round started");
    sse_events::broadcast_round_started(state, &flag);

    Ok(StartRoundResponse {
        started: true,
        started_at: flag.started_at.map(format_system_time),
        already_started: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::memory::MemoryQuizStore,
        dto::admin::{QuizInput, SeedRoundRequest},
        services::round_service,
        state::AppState,
    };
    use std::sync::Arc;

    async fn seeded_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryQuizStore::new())).await;
        round_service::seed_round(
            &state,
            SeedRoundRequest {
                quizzes: vec![QuizInput {
                    question: "only question".into(),
                    options: vec!["a".into(), "b".into()],
                }],
            },
        )
        .await
        .unwrap();
        state
    }

    #[tokio::test]
    async fn starting_requires_a_seeded_round() {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryQuizStore::new())).await;

        let err = start_round(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn starting_sets_and_persists_the_flag() {
        let state = seeded_state().await;

        let response = start_round(&state).await.unwrap();
        assert!(response.started);
        assert!(!response.already_started);
        assert!(state.signal().is_started());

        let persisted = state
            .require_store()
            .await
            .unwrap()
            .read_start_flag()
            .await
            .unwrap();
        assert!(persisted.started);
    }

    #[tokio::test]
    async fn a_second_start_keeps_the_original_timestamp() {
        let state = seeded_state().await;

        let first = start_round(&state).await.unwrap();
        let second = start_round(&state).await.unwrap();

        assert!(second.already_started);
        assert_eq!(second.started_at, first.started_at);
    }

    #[tokio::test]
    async fn watchers_observe_the_flag_flip() {
        let state = seeded_state().await;
        let mut watcher = state.signal().watcher();
        assert!(!watcher.borrow().started);

        start_round(&state).await.unwrap();

        watcher.changed().await.unwrap();
        assert!(watcher.borrow().started);
    }
}
