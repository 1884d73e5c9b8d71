//! Answer submission payloads and advance directives.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dao::models::AnswerEntity, dto::format_system_time};

/// Payload confirming a team's buffered selection for the current quiz.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAnswerRequest {
    /// Session identity performing the submission.
    pub identity_id: Uuid,
    /// Index of the selected option. Absent when the user confirmed without
    /// selecting, which is rejected before any side effect.
    pub option_index: Option<u32>,
}

/// Where the client goes after a recorded (or reconciled) submission.
///
/// The next position always travels as explicit data in the response; it is
/// never inferred server-side from remembered state.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvanceDirective {
    /// Render the quiz at `index` next.
    Next {
        /// Position of the next quiz.
        index: u32,
    },
    /// The sequence is exhausted; move to the results-pending view.
    Results,
}

/// Response to an answer submission.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitAnswerResponse {
    /// True when this call created the answer record. False when an answer
    /// for the pair already existed — the duplicate is benign and the
    /// directive still advances.
    pub recorded: bool,
    /// Explicit navigation directive for the client.
    pub advance: AdvanceDirective,
}

/// A recorded answer as exposed to result collation.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerRecord {
    /// Quiz the answer refers to.
    pub quiz_id: Uuid,
    /// Team the answer is recorded for.
    pub team_id: Uuid,
    /// Selected option index.
    pub option_index: u32,
    /// RFC 3339 submission timestamp.
    pub submitted_at: String,
}

impl From<AnswerEntity> for AnswerRecord {
    fn from(entity: AnswerEntity) -> Self {
        Self {
            quiz_id: entity.quiz_id,
            team_id: entity.team_id,
            option_index: entity.option_index,
            submitted_at: format_system_time(entity.submitted_at),
        }
    }
}

/// Response listing the answers recorded for one quiz.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswersResponse {
    /// Quiz the answers belong to.
    pub quiz_id: Uuid,
    /// Recorded answers, oldest first.
    pub answers: Vec<AnswerRecord>,
}
