//! Round lifecycle and quiz sequencing.
//!
//! The quiz sequence is fixed when a round is seeded; afterwards this module
//! only answers positional reads (`quiz at index`, length, last-index checks).

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{QuizEntity, StartFlagEntity},
    dto::{
        admin::{SeedRoundRequest, SeedRoundResponse},
        quiz::{QuizView, RoundSummary},
    },
    error::ServiceError,
    services::sse_events,
    state::{SharedState, round::Round},
};

/// Replace the quiz sequence with a brand-new round.
///
/// Seeding resets the start flag and drops every client flow: the previous
/// round, if any, is over.
pub async fn seed_round(
    state: &SharedState,
    request: SeedRoundRequest,
) -> Result<SeedRoundResponse, ServiceError> {
    if request.quizzes.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a round requires at least one quiz".into(),
        ));
    }

    let mut entities = Vec::with_capacity(request.quizzes.len());
    for (position, quiz) in request.quizzes.into_iter().enumerate() {
        if quiz.question.trim().is_empty() {
            return Err(ServiceError::InvalidInput(format!(
                "quiz {position} has a blank question"
            )));
        }
        if quiz.options.len() < 2 {
            return Err(ServiceError::InvalidInput(format!(
                "quiz {position} needs at least 2 options (got {})",
                quiz.options.len()
            )));
        }

        entities.push(QuizEntity {
            id: Uuid::new_v4(),
            position: position as u32,
            question: quiz.question,
            options: quiz.options,
        });
    }

    let store = state.require_store().await?;
    store.replace_quizzes(entities.clone()).await?;
    store.write_start_flag(StartFlagEntity::default()).await?;

    let round = Round::from_entities(entities);
    let length = round.len();
    state.install_round(round).await;
    state.signal().reset();
    state.clear_flows();

    info!(length, "seeded a brand-new round");
    sse_events::broadcast_round_seeded(state, length);

    Ok(SeedRoundResponse { length })
}

/// Summarize the active round: sequence length plus the start flag.
pub async fn round_summary(state: &SharedState) -> Result<RoundSummary, ServiceError> {
    let round = state.require_round().await?;
    Ok(RoundSummary {
        length: round.len(),
        started: state.signal().is_started(),
    })
}

/// Resolve the quiz at `index` within the active round.
pub async fn quiz_view(state: &SharedState, index: u32) -> Result<QuizView, ServiceError> {
    let round = state.require_round().await?;
    let quiz = round.quiz_at(index).ok_or(ServiceError::OutOfRange {
        index,
        length: round.len(),
    })?;
    Ok(QuizView::from_round(&round, index, quiz))
}

/// Load the persisted round and start flag into memory.
///
/// Called whenever a store backend is (re)installed, so a restarted server
/// resumes the round in progress. When the store holds no quizzes and the
/// configuration ships a fixture, the fixture becomes the first round.
pub async fn hydrate(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let mut quizzes = store.list_quizzes().await?;
    if quizzes.is_empty()
        && let Some(fixture) = state.config().fixture_entities()
    {
        info!(count = fixture.len(), "seeding round from config fixture");
        store.replace_quizzes(fixture.clone()).await?;
        quizzes = fixture;
    }

    if !quizzes.is_empty() {
        let round = Round::from_entities(quizzes);
        info!(length = round.len(), "hydrated round from store");
        state.install_round(round).await;
    }

    let flag = store.read_start_flag().await?;
    state.signal().hydrate(flag);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::memory::MemoryQuizStore,
        dto::admin::QuizInput,
        state::AppState,
    };
    use std::sync::Arc;

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryQuizStore::new())).await;
        state
    }

    fn quiz_input(question: &str) -> QuizInput {
        QuizInput {
            question: question.into(),
            options: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    async fn seed(state: &SharedState, count: usize) {
        let quizzes = (0..count)
            .map(|i| quiz_input(&format!("question {i}")))
            .collect();
        seed_round(state, SeedRoundRequest { quizzes }).await.unwrap();
    }

    #[tokio::test]
    async fn seeding_an_empty_round_is_rejected() {
        let state = test_state().await;
        let err = seed_round(&state, SeedRoundRequest { quizzes: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn quiz_view_resolves_within_bounds_only() {
        let state = test_state().await;
        seed(&state, 3).await;

        for index in 0..3 {
            let view = quiz_view(&state, index).await.unwrap();
            assert_eq!(view.index, index);
            assert_eq!(view.is_last, index == 2);
        }

        let err = quiz_view(&state, 3).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::OutOfRange { index: 3, length: 3 }
        ));
    }

    #[tokio::test]
    async fn seeding_resets_the_start_flag() {
        let state = test_state().await;
        seed(&state, 2).await;

        state.signal().mark_started(StartFlagEntity::started_now());
        assert!(state.signal().is_started());

        seed(&state, 2).await;
        assert!(!state.signal().is_started());
        assert!(!round_summary(&state).await.unwrap().started);
    }

    #[tokio::test]
    async fn hydrate_restores_round_and_flag_from_store() {
        let state = test_state().await;
        seed(&state, 2).await;
        state.signal().mark_started(StartFlagEntity::started_now());
        let store = state.require_store().await.unwrap();
        store
            .write_start_flag(StartFlagEntity::started_now())
            .await
            .unwrap();

        // A fresh state over the same store simulates a server restart.
        let restarted = AppState::new(AppConfig::default());
        restarted.install_store(store).await;
        hydrate(&restarted).await.unwrap();

        assert_eq!(restarted.require_round().await.unwrap().len(), 2);
        assert!(restarted.signal().is_started());
    }

    #[tokio::test]
    async fn round_summary_without_a_round_is_not_found() {
        let state = test_state().await;
        let err = round_summary(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
