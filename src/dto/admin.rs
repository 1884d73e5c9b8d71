//! DTO definitions used by the admin REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::validation::{validate_display_name, validate_quiz_options};

/// One quiz definition inside a round seed request.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct QuizInput {
    /// Question text. Must not be blank.
    #[validate(custom(function = validate_display_name))]
    pub question: String,
    /// Ordered answer options; at least two, none blank.
    #[validate(custom(function = validate_quiz_options))]
    pub options: Vec<String>,
}

/// Payload replacing the quiz sequence with a brand-new round.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SeedRoundRequest {
    /// Quizzes in presentation order.
    #[validate(nested)]
    pub quizzes: Vec<QuizInput>,
}

/// Response confirming a seeded round.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeedRoundResponse {
    /// Number of quizzes in the new sequence.
    pub length: usize,
}

/// Response to the start-round action.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartRoundResponse {
    /// Always true after a successful call; the flag is monotonic.
    pub started: bool,
    /// RFC 3339 timestamp of the original start action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    /// True when the flag was already set and this call was a no-op.
    pub already_started: bool,
}
