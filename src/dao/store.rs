//! Object-safe store trait implemented by every backend.

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{
    AnswerEntity, AnswerInsert, MembershipEntity, QuizEntity, StartFlagEntity, TeamEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for teams, memberships, the quiz
/// sequence, the start flag, and the answer ledger.
///
/// Backends must enforce the at-most-one-answer-per-`(quiz, team)` invariant
/// at the storage layer: [`QuizStore::try_insert_answer`] reports whether the
/// write created a record or hit an existing one, and never overwrites.
pub trait QuizStore: Send + Sync {
    /// Persist a team. Upsert keyed by team id.
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a team by id.
    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// List all teams in creation order.
    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>>;

    /// Upsert the membership for an identity, overwriting any previous one.
    fn save_membership(
        &self,
        membership: MembershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the membership for an identity, if any.
    fn find_membership(
        &self,
        identity_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MembershipEntity>>>;

    /// Replace the whole quiz sequence for a brand-new round.
    fn replace_quizzes(&self, quizzes: Vec<QuizEntity>)
    -> BoxFuture<'static, StorageResult<()>>;
    /// List the quiz sequence ordered by position.
    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>>;

    /// Read the current start flag document.
    fn read_start_flag(&self) -> BoxFuture<'static, StorageResult<StartFlagEntity>>;
    /// Write the start flag document.
    fn write_start_flag(&self, flag: StartFlagEntity) -> BoxFuture<'static, StorageResult<()>>;

    /// Insert an answer unless one already exists for its `(quiz, team)` pair.
    fn try_insert_answer(
        &self,
        answer: AnswerEntity,
    ) -> BoxFuture<'static, StorageResult<AnswerInsert>>;
    /// Fetch the answer recorded for a `(quiz, team)` pair, if any.
    fn find_answer(
        &self,
        quiz_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>>;
    /// List every answer recorded for a quiz, for result collation.
    fn answers_for(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>>;

    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a broken backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
