//! Answer ledger: at-most-one answer per (quiz, team).
//!
//! Uniqueness is enforced by the storage layer (composite key), so two racing
//! submissions for the same pair resolve to exactly one stored answer no
//! matter which server task gets there first.

use uuid::Uuid;

use crate::{
    dao::models::{AnswerEntity, AnswerInsert},
    error::ServiceError,
    state::{SharedState, round::RoundQuiz},
};

/// Record a team's answer for a quiz.
///
/// Returns [`ServiceError::DuplicateAnswer`] when the (quiz, team) pair
/// already holds an answer; callers decide whether that is an error or a
/// benign replay.
pub async fn submit(
    state: &SharedState,
    quiz: &RoundQuiz,
    team_id: Uuid,
    identity_id: Uuid,
    option_index: u32,
) -> Result<AnswerEntity, ServiceError> {
    if option_index as usize >= quiz.options.len() {
        return Err(ServiceError::InvalidInput(format!(
            "option index {option_index} is out of range for a quiz with {} options",
            quiz.options.len()
        )));
    }

    let answer = AnswerEntity::new(quiz.id, team_id, identity_id, option_index);
    let store = state.require_store().await?;
    match store.try_insert_answer(answer.clone()).await? {
        AnswerInsert::Created => Ok(answer),
        AnswerInsert::Duplicate => Err(ServiceError::DuplicateAnswer {
            quiz_id: quiz.id,
            team_id,
        }),
    }
}

/// True iff the team already answered the given quiz.
pub async fn has_answered(
    state: &SharedState,
    quiz_id: Uuid,
    team_id: Uuid,
) -> Result<bool, ServiceError> {
    let store = state.require_store().await?;
    Ok(store.find_answer(quiz_id, team_id).await?.is_some())
}

/// Every answer recorded for a quiz, in submission order.
pub async fn answers_for(
    state: &SharedState,
    quiz_id: Uuid,
) -> Result<Vec<AnswerEntity>, ServiceError> {
    let store = state.require_store().await?;
    Ok(store.answers_for(quiz_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::memory::MemoryQuizStore, state::AppState};
    use std::sync::Arc;

    async fn test_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryQuizStore::new())).await;
        state
    }

    fn sample_quiz() -> RoundQuiz {
        RoundQuiz {
            id: Uuid::new_v4(),
            question: "pick one".into(),
            options: vec!["a".into(), "b".into()],
        }
    }

    #[tokio::test]
    async fn first_submission_is_recorded() {
        let state = test_state().await;
        let quiz = sample_quiz();
        let team_id = Uuid::new_v4();

        let answer = submit(&state, &quiz, team_id, Uuid::new_v4(), 1)
            .await
            .unwrap();
        assert_eq!(answer.option_index, 1);
        assert!(has_answered(&state, quiz.id, team_id).await.unwrap());
    }

    #[tokio::test]
    async fn second_submission_for_the_same_pair_is_a_duplicate() {
        let state = test_state().await;
        let quiz = sample_quiz();
        let team_id = Uuid::new_v4();

        submit(&state, &quiz, team_id, Uuid::new_v4(), 0)
            .await
            .unwrap();
        let err = submit(&state, &quiz, team_id, Uuid::new_v4(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateAnswer { .. }));

        // The original answer is untouched.
        let answers = answers_for(&state, quiz.id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].option_index, 0);
    }

    #[tokio::test]
    async fn concurrent_submissions_keep_exactly_one_answer() {
        let state = test_state().await;
        let quiz = sample_quiz();
        let team_id = Uuid::new_v4();

        let mut handles = Vec::new();
        for i in 0..8u32 {
            let state = state.clone();
            let quiz = quiz.clone();
            handles.push(tokio::spawn(async move {
                submit(&state, &quiz, team_id, Uuid::new_v4(), i % 2).await
            }));
        }

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(ServiceError::DuplicateAnswer { .. }) => duplicates += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(answers_for(&state, quiz.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn option_index_is_bounds_checked() {
        let state = test_state().await;
        let quiz = sample_quiz();

        let err = submit(&state, &quiz, Uuid::new_v4(), Uuid::new_v4(), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn different_teams_each_hold_their_own_answer() {
        let state = test_state().await;
        let quiz = sample_quiz();

        submit(&state, &quiz, Uuid::new_v4(), Uuid::new_v4(), 0)
            .await
            .unwrap();
        submit(&state, &quiz, Uuid::new_v4(), Uuid::new_v4(), 1)
            .await
            .unwrap();

        assert_eq!(answers_for(&state, quiz.id).await.unwrap().len(), 2);
    }
}
