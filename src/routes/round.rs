//! Round, quiz view, and answer endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        answer::{AnswersResponse, SubmitAnswerRequest, SubmitAnswerResponse},
        flow::FlowSnapshotResponse,
        quiz::{IdentityParams, IndexParams, QuizView, QuizViewParams, RoundSummary},
    },
    error::{AppError, ServiceError},
    services::{flow_service, ledger_service, round_service},
    state::SharedState,
};

/// Routes exposing the active round to answering teams.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/round", get(round_summary))
        .route("/round/quiz", get(quiz_view))
        .route("/round/flow", get(flow_snapshot))
        .route("/round/answers", post(submit_answer))
        .route("/round/quizzes/{quiz_id}/answers", get(quiz_answers))
}

/// Summarize the active round.
#[utoipa::path(
    get,
    path = "/round",
    tag = "round",
    responses(
        (status = 200, description = "Active round summary", body = RoundSummary),
        (status = 404, description = "No round has been seeded")
    )
)]
pub async fn round_summary(
    State(state): State<SharedState>,
) -> Result<Json<RoundSummary>, AppError> {
    Ok(Json(round_service::round_summary(&state).await?))
}

/// Resolve the quiz at an explicit position for an answering client.
///
/// `index` is required; a request without it is rejected rather than
/// defaulted to the first quiz.
#[utoipa::path(
    get,
    path = "/round/quiz",
    tag = "round",
    params(QuizViewParams),
    responses(
        (status = 200, description = "Quiz at the requested position", body = QuizView),
        (status = 400, description = "Missing or out-of-range index"),
        (status = 401, description = "Unknown identity or no team joined"),
        (status = 409, description = "Round not started or flow already past answering")
    )
)]
pub async fn quiz_view(
    State(state): State<SharedState>,
    Query(params): Query<QuizViewParams>,
) -> Result<Json<QuizView>, AppError> {
    let index = params
        .index
        .ok_or(ServiceError::MissingParameter("index"))?;
    let identity_id = params
        .identity_id
        .ok_or(ServiceError::MissingParameter("identity_id"))?;

    let view = flow_service::enter_quiz(&state, identity_id, index).await?;
    Ok(Json(view))
}

/// Snapshot the caller's flow for diagnostics and UI recovery.
#[utoipa::path(
    get,
    path = "/round/flow",
    tag = "round",
    params(IdentityParams),
    responses(
        (status = 200, description = "Current flow snapshot", body = FlowSnapshotResponse),
        (status = 401, description = "Unknown identity")
    )
)]
pub async fn flow_snapshot(
    State(state): State<SharedState>,
    Query(params): Query<IdentityParams>,
) -> Result<Json<FlowSnapshotResponse>, AppError> {
    let identity_id = params
        .identity_id
        .ok_or(ServiceError::MissingParameter("identity_id"))?;
    Ok(Json(flow_service::snapshot(&state, identity_id).await?))
}

/// Confirm a team's answer for the quiz at an explicit position.
#[utoipa::path(
    post,
    path = "/round/answers",
    tag = "round",
    params(IndexParams),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded or reconciled", body = SubmitAnswerResponse),
        (status = 400, description = "Missing index or invalid option"),
        (status = 401, description = "Unknown identity or no team joined"),
        (status = 409, description = "Flow is not answering this quiz")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Query(params): Query<IndexParams>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    let index = params
        .index
        .ok_or(ServiceError::MissingParameter("index"))?;
    let response = flow_service::confirm_answer(&state, index, payload).await?;
    Ok(Json(response))
}

/// List the answers recorded for one quiz, oldest first.
#[utoipa::path(
    get,
    path = "/round/quizzes/{quiz_id}/answers",
    tag = "round",
    params(("quiz_id" = String, Path, description = "Identifier of the quiz")),
    responses((status = 200, description = "Recorded answers", body = AnswersResponse))
)]
pub async fn quiz_answers(
    State(state): State<SharedState>,
    Path(quiz_id): Path<Uuid>,
) -> Result<Json<AnswersResponse>, AppError> {
    let answers = ledger_service::answers_for(&state, quiz_id).await?;
    Ok(Json(AnswersResponse {
        quiz_id,
        answers: answers.into_iter().map(Into::into).collect(),
    }))
}
