use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{AnswerEntity, MembershipEntity, QuizEntity, StartFlagEntity, TeamEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    name: String,
    created_at: DateTime,
}

impl From<TeamEntity> for MongoTeamDocument {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoTeamDocument> for TeamEntity {
    fn from(value: MongoTeamDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMembershipDocument {
    /// Keyed by the identity so an upsert naturally overwrites reassignments.
    #[serde(rename = "_id")]
    identity_id: Uuid,
    team_id: Uuid,
    updated_at: DateTime,
}

impl From<MembershipEntity> for MongoMembershipDocument {
    fn from(value: MembershipEntity) -> Self {
        Self {
            identity_id: value.identity_id,
            team_id: value.team_id,
            updated_at: DateTime::from_system_time(value.updated_at),
        }
    }
}

impl From<MongoMembershipDocument> for MembershipEntity {
    fn from(value: MongoMembershipDocument) -> Self {
        Self {
            identity_id: value.identity_id,
            team_id: value.team_id,
            updated_at: value.updated_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuizDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    position: u32,
    question: String,
    options: Vec<String>,
}

impl From<QuizEntity> for MongoQuizDocument {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: value.id,
            position: value.position,
            question: value.question,
            options: value.options,
        }
    }
}

impl From<MongoQuizDocument> for QuizEntity {
    fn from(value: MongoQuizDocument) -> Self {
        Self {
            id: value.id,
            position: value.position,
            question: value.question,
            options: value.options,
        }
    }
}

/// Singleton flag document; a fixed `_id` keeps one flag per deployment.
pub const START_FLAG_DOC_ID: &str = "start-flag";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStartFlagDocument {
    #[serde(rename = "_id")]
    id: String,
    started: bool,
    started_at: Option<DateTime>,
}

impl From<StartFlagEntity> for MongoStartFlagDocument {
    fn from(value: StartFlagEntity) -> Self {
        Self {
            id: START_FLAG_DOC_ID.to_owned(),
            started: value.started,
            started_at: value.started_at.map(DateTime::from_system_time),
        }
    }
}

impl From<MongoStartFlagDocument> for StartFlagEntity {
    fn from(value: MongoStartFlagDocument) -> Self {
        Self {
            started: value.started,
            started_at: value.started_at.map(|ts| ts.to_system_time()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAnswerDocument {
    /// Composite `{quiz_id}_{team_id}` key: document-level uniqueness is what
    /// enforces at most one answer per pair even under racing inserts.
    #[serde(rename = "_id")]
    id: String,
    quiz_id: Uuid,
    team_id: Uuid,
    identity_id: Uuid,
    option_index: u32,
    submitted_at: DateTime,
}

/// Composite document id for an answer.
pub fn answer_doc_id(quiz_id: Uuid, team_id: Uuid) -> String {
    format!("{}_{}", quiz_id.simple(), team_id.simple())
}

impl From<AnswerEntity> for MongoAnswerDocument {
    fn from(value: AnswerEntity) -> Self {
        Self {
            id: answer_doc_id(value.quiz_id, value.team_id),
            quiz_id: value.quiz_id,
            team_id: value.team_id,
            identity_id: value.identity_id,
            option_index: value.option_index,
            submitted_at: DateTime::from_system_time(value.submitted_at),
        }
    }
}

impl From<MongoAnswerDocument> for AnswerEntity {
    fn from(value: MongoAnswerDocument) -> Self {
        Self {
            quiz_id: value.quiz_id,
            team_id: value.team_id,
            identity_id: value.identity_id,
            option_index: value.option_index,
            submitted_at: value.submitted_at.to_system_time(),
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
