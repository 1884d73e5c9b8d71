//! Quiz views and round query parameters.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::state::round::{Round, RoundQuiz};

/// Query parameters for the quiz view endpoint.
///
/// `index` is deliberately optional at the deserialization layer so its
/// absence can be rejected as a missing-parameter error rather than a generic
/// deserialization failure — position is never defaulted to zero.
#[derive(Debug, Deserialize, IntoParams)]
pub struct QuizViewParams {
    /// Zero-based position of the quiz to render. Required.
    pub index: Option<u32>,
    /// Session identity of the requesting client. Required.
    pub identity_id: Option<Uuid>,
}

/// Query parameter carrying only a quiz position.
#[derive(Debug, Deserialize, IntoParams)]
pub struct IndexParams {
    /// Zero-based position of the quiz. Required.
    pub index: Option<u32>,
}

/// Query parameter carrying only a session identity.
#[derive(Debug, Deserialize, IntoParams)]
pub struct IdentityParams {
    /// Session identity of the requesting client. Required.
    pub identity_id: Option<Uuid>,
}

/// A quiz as rendered to an answering team.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizView {
    /// Stable identifier for the quiz.
    pub id: Uuid,
    /// Position of this quiz in the round sequence.
    pub index: u32,
    /// Question text.
    pub question: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// True when this is the final quiz, so clients need not refetch the
    /// whole sequence to detect the terminal index.
    pub is_last: bool,
}

impl QuizView {
    /// Project a round quiz at a given position.
    pub fn from_round(round: &Round, index: u32, quiz: &RoundQuiz) -> Self {
        Self {
            id: quiz.id,
            index,
            question: quiz.question.clone(),
            options: quiz.options.clone(),
            is_last: round.is_last(index),
        }
    }
}

/// Summary of the active round exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundSummary {
    /// Number of quizzes in the sequence.
    pub length: usize,
    /// Whether the administrator has started the round.
    pub started: bool,
}
