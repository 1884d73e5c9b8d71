//! Per-client game-flow coordination.
//!
//! Every mutation of a client flow goes through [`ClientFlow::run_transition`]
//! so the ledger write and the phase change land together or not at all.
//!
//! [`ClientFlow::run_transition`]: crate::state::ClientFlow::run_transition

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        answer::{AdvanceDirective, SubmitAnswerRequest, SubmitAnswerResponse},
        flow::FlowSnapshotResponse,
        quiz::QuizView,
    },
    error::ServiceError,
    services::{ledger_service, round_service, team_service},
    state::{FlowEvent, FlowPhase, SharedState},
};

/// Resolve the quiz at `index` for a client, advancing its flow as needed.
///
/// A client sitting in the lobby is moved through the start of the round
/// first; a client already answering is repositioned to the requested index.
/// The index comes from the caller's navigation parameter and always wins
/// over whatever position the flow remembers.
pub async fn enter_quiz(
    state: &SharedState,
    identity_id: Uuid,
    index: u32,
) -> Result<QuizView, ServiceError> {
    let flow = state.require_flow(identity_id)?;
    // Out-of-range indexes must not move the flow, so resolve the quiz first.
    let view = round_service::quiz_view(state, index).await?;
    team_service::require_team_id(state, identity_id).await?;

    match flow.phase().await {
        FlowPhase::Lobby => {
            if !state.signal().is_started() {
                return Err(ServiceError::InvalidState(
                    "the round has not been started".into(),
                ));
            }
            navigate(state, identity_id, FlowEvent::SignalFired).await?;
            navigate(state, identity_id, FlowEvent::QuizResolved { index }).await?;
        }
        // A previous startup stopped halfway; finish resolving the quiz.
        FlowPhase::Starting => {
            navigate(state, identity_id, FlowEvent::QuizResolved { index }).await?;
        }
        FlowPhase::Answering(current) => {
            if current != index {
                navigate(state, identity_id, FlowEvent::Resume { index }).await?;
            }
        }
        other => {
            return Err(ServiceError::InvalidState(format!(
                "cannot view a quiz from phase {other:?}"
            )));
        }
    }

    debug!(%identity_id, index, "client entered quiz");
    Ok(view)
}

/// Confirm a client's answer for the quiz at `index` and move it forward.
///
/// The ledger enforces at most one answer per (quiz, team); a replayed
/// confirmation is benign and yields the same advance directive with
/// `recorded: false`.
pub async fn confirm_answer(
    state: &SharedState,
    index: u32,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let identity_id = request.identity_id;
    let flow = state.require_flow(identity_id)?;
    let round = state.require_round().await?;
    let quiz = round
        .quiz_at(index)
        .ok_or(ServiceError::OutOfRange {
            index,
            length: round.len(),
        })?
        .clone();
    let last = round.is_last(index);
    let team_id = team_service::require_team_id(state, identity_id).await?;
    let option_index = request
        .option_index
        .ok_or(ServiceError::MissingParameter("option_index"))?;

    let recorded = match flow.phase().await {
        FlowPhase::Answering(current) => {
            if current != index {
                navigate(state, identity_id, FlowEvent::Resume { index }).await?;
            }

            let (recorded, _) = flow
                .run_transition(FlowEvent::Confirm, || async {
                    match ledger_service::submit(state, &quiz, team_id, identity_id, option_index)
                        .await
                    {
                        Ok(_) => Ok(true),
                        // Another device of the same team got there first;
                        // the client still moves forward.
                        Err(ServiceError::DuplicateAnswer { .. }) => Ok(false),
                        Err(err) => Err(err),
                    }
                })
                .await?;
            recorded
        }
        // The previous confirmation recorded the answer but the advance step
        // never ran; pick it up from there. Re-record only if the ledger
        // lost the answer in between.
        FlowPhase::Advancing(current) if current == index => {
            if ledger_service::has_answered(state, quiz.id, team_id).await? {
                false
            } else {
                match ledger_service::submit(state, &quiz, team_id, identity_id, option_index).await
                {
                    Ok(_) => true,
                    Err(ServiceError::DuplicateAnswer { .. }) => false,
                    Err(err) => return Err(err),
                }
            }
        }
        other => {
            return Err(ServiceError::InvalidState(format!(
                "cannot confirm an answer from phase {other:?}"
            )));
        }
    };

    navigate(state, identity_id, FlowEvent::Advance { last }).await?;

    let advance = if last {
        AdvanceDirective::Results
    } else {
        AdvanceDirective::Next { index: index + 1 }
    };

    info!(%identity_id, %team_id, index, recorded, "answer confirmed");
    Ok(SubmitAnswerResponse { recorded, advance })
}

/// Snapshot a client flow for diagnostics.
pub async fn snapshot(
    state: &SharedState,
    identity_id: Uuid,
) -> Result<FlowSnapshotResponse, ServiceError> {
    let flow = state.require_flow(identity_id)?;
    Ok(flow.snapshot().await.into())
}

/// Apply a transition that carries no side effect of its own.
async fn navigate(
    state: &SharedState,
    identity_id: Uuid,
    event: FlowEvent,
) -> Result<FlowPhase, ServiceError> {
    let flow = state.require_flow(identity_id)?;
    let ((), phase) = flow
        .run_transition(event, || async { Ok(()) })
        .await?;
    Ok(phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{memory::MemoryQuizStore, models::StartFlagEntity},
        dto::{
            admin::{QuizInput, SeedRoundRequest},
            team::RegisterTeamRequest,
        },
        services::{round_service, signal_service},
        state::AppState,
    };
    use std::sync::Arc;

    async fn seeded_state(quiz_count: usize) -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.install_store(Arc::new(MemoryQuizStore::new())).await;

        let quizzes = (0..quiz_count)
            .map(|i| QuizInput {
                question: format!("question {i}"),
                options: vec!["a".into(), "b".into(), "c".into()],
            })
            .collect();
        round_service::seed_round(&state, SeedRoundRequest { quizzes })
            .await
            .unwrap();
        state
    }

    async fn joined_identity(state: &SharedState, team_name: &str) -> Uuid {
        let identity_id = state.register_identity();
        let team = team_service::register_team(
            state,
            RegisterTeamRequest {
                name: team_name.into(),
            },
        )
        .await
        .unwrap();
        team_service::join_team(state, team.id, identity_id)
            .await
            .unwrap();
        identity_id
    }

    fn answer(identity_id: Uuid, option_index: u32) -> SubmitAnswerRequest {
        SubmitAnswerRequest {
            identity_id,
            option_index: Some(option_index),
        }
    }

    #[tokio::test]
    async fn quiz_is_hidden_until_the_round_starts() {
        let state = seeded_state(2).await;
        let identity_id = joined_identity(&state, "early birds").await;

        let err = enter_quiz(&state, identity_id, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        signal_service::start_round(&state).await.unwrap();
        let view = enter_quiz(&state, identity_id, 0).await.unwrap();
        assert_eq!(view.index, 0);
        assert_eq!(
            state.require_flow(identity_id).unwrap().phase().await,
            FlowPhase::Answering(0)
        );
    }

    #[tokio::test]
    async fn full_round_walkthrough() {
        let state = seeded_state(3).await;
        let identity_id = joined_identity(&state, "walkers").await;
        signal_service::start_round(&state).await.unwrap();

        for index in 0..3u32 {
            let view = enter_quiz(&state, identity_id, index).await.unwrap();
            assert_eq!(view.is_last, index == 2);

            let response = confirm_answer(&state, index, answer(identity_id, 1))
                .await
                .unwrap();
            assert!(response.recorded);
            if index < 2 {
                assert_eq!(response.advance, AdvanceDirective::Next { index: index + 1 });
            } else {
                assert_eq!(response.advance, AdvanceDirective::Results);
            }
        }

        assert_eq!(
            state.require_flow(identity_id).unwrap().phase().await,
            FlowPhase::ResultsWait
        );
    }

    #[tokio::test]
    async fn reload_re_enters_the_same_quiz() {
        let state = seeded_state(3).await;
        let identity_id = joined_identity(&state, "reloaders").await;
        signal_service::start_round(&state).await.unwrap();

        enter_quiz(&state, identity_id, 1).await.unwrap();
        // Same parameter after a reload resolves the same quiz.
        let view = enter_quiz(&state, identity_id, 1).await.unwrap();
        assert_eq!(view.index, 1);
        assert_eq!(
            state.require_flow(identity_id).unwrap().phase().await,
            FlowPhase::Answering(1)
        );
    }

    #[tokio::test]
    async fn teammate_replay_is_benign() {
        let state = seeded_state(2).await;
        let team = team_service::register_team(
            &state,
            RegisterTeamRequest {
                name: "shared team".into(),
            },
        )
        .await
        .unwrap();

        let first = state.register_identity();
        let second = state.register_identity();
        for identity_id in [first, second] {
            team_service::join_team(&state, team.id, identity_id)
                .await
                .unwrap();
        }
        signal_service::start_round(&state).await.unwrap();

        enter_quiz(&state, first, 0).await.unwrap();
        enter_quiz(&state, second, 0).await.unwrap();

        let winner = confirm_answer(&state, 0, answer(first, 0)).await.unwrap();
        assert!(winner.recorded);

        // The second device submits for the same (quiz, team) pair: nothing
        // is overwritten, but it advances just the same.
        let replay = confirm_answer(&state, 0, answer(second, 2)).await.unwrap();
        assert!(!replay.recorded);
        assert_eq!(replay.advance, winner.advance);

        let answers = ledger_service::answers_for(
            &state,
            state.require_round().await.unwrap().quiz_at(0).unwrap().id,
        )
        .await
        .unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].option_index, 0);
    }

    #[tokio::test]
    async fn out_of_range_index_does_not_move_the_flow() {
        let state = seeded_state(2).await;
        let identity_id = joined_identity(&state, "explorers").await;
        signal_service::start_round(&state).await.unwrap();

        let err = enter_quiz(&state, identity_id, 7).await.unwrap_err();
        assert!(matches!(err, ServiceError::OutOfRange { index: 7, .. }));
        assert_eq!(
            state.require_flow(identity_id).unwrap().phase().await,
            FlowPhase::Lobby
        );
    }

    #[tokio::test]
    async fn confirming_without_an_option_is_rejected() {
        let state = seeded_state(1).await;
        let identity_id = joined_identity(&state, "undecided").await;
        signal_service::start_round(&state).await.unwrap();
        enter_quiz(&state, identity_id, 0).await.unwrap();

        let err = confirm_answer(
            &state,
            0,
            SubmitAnswerRequest {
                identity_id,
                option_index: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::MissingParameter("option_index")));
    }

    #[tokio::test]
    async fn confirming_from_the_lobby_is_rejected() {
        let state = seeded_state(1).await;
        let identity_id = joined_identity(&state, "jumpers").await;
        signal_service::start_round(&state).await.unwrap();

        let err = confirm_answer(&state, 0, answer(identity_id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn interrupted_confirmation_resumes_the_advance() {
        let state = seeded_state(2).await;
        let identity_id = joined_identity(&state, "resumers").await;
        signal_service::start_round(&state).await.unwrap();
        enter_quiz(&state, identity_id, 0).await.unwrap();

        // Land the confirm transition without running the advance, as if
        // the process stopped between the two.
        let flow = state.require_flow(identity_id).unwrap();
        let quiz = state
            .require_round()
            .await
            .unwrap()
            .quiz_at(0)
            .unwrap()
            .clone();
        let team_id = team_service::require_team_id(&state, identity_id)
            .await
            .unwrap();
        flow.run_transition(FlowEvent::Confirm, || async {
            ledger_service::submit(&state, &quiz, team_id, identity_id, 1).await
        })
        .await
        .unwrap();
        assert_eq!(flow.phase().await, FlowPhase::Advancing(0));

        // The retried confirmation finds the recorded answer and only
        // finishes the advance.
        let response = confirm_answer(&state, 0, answer(identity_id, 1))
            .await
            .unwrap();
        assert!(!response.recorded);
        assert_eq!(response.advance, AdvanceDirective::Next { index: 1 });

        let answers = ledger_service::answers_for(&state, quiz.id).await.unwrap();
        assert_eq!(answers.len(), 1);
    }

    #[tokio::test]
    async fn late_joiner_resumes_at_the_requested_index() {
        let state = seeded_state(3).await;
        let identity_id = joined_identity(&state, "latecomers").await;
        state.signal().mark_started(StartFlagEntity::started_now());

        // First view lands directly on index 2, not on 0.
        let view = enter_quiz(&state, identity_id, 2).await.unwrap();
        assert_eq!(view.index, 2);
        assert!(view.is_last);

        let response = confirm_answer(&state, 2, answer(identity_id, 0))
            .await
            .unwrap();
        assert_eq!(response.advance, AdvanceDirective::Results);
    }
}
