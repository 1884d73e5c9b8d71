//! In-process store backend.
//!
//! Default backend when no external database is configured, and the backend
//! used by the test suite. Keeps everything in memory with the same contract
//! as the persistent backends, including key-level enforcement of the
//! at-most-one-answer invariant.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    models::{
        AnswerEntity, AnswerInsert, MembershipEntity, QuizEntity, StartFlagEntity, TeamEntity,
    },
    storage::StorageResult,
    store::QuizStore,
};

/// Store backend holding all documents in process memory.
#[derive(Clone, Default)]
pub struct MemoryQuizStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    // IndexMap keeps insertion order so team listings come back in
    // creation order without a separate sort key.
    teams: RwLock<IndexMap<Uuid, TeamEntity>>,
    memberships: DashMap<Uuid, MembershipEntity>,
    quizzes: RwLock<Vec<QuizEntity>>,
    start_flag: RwLock<StartFlagEntity>,
    // Composite key mirrors the unique index persistent backends declare.
    answers: DashMap<(Uuid, Uuid), AnswerEntity>,
}

impl MemoryQuizStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuizStore for MemoryQuizStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.teams.write().await.insert(team.id, team);
            Ok(())
        })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.teams.read().await.get(&id).cloned()) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.teams.read().await.values().cloned().collect()) })
    }

    fn save_membership(
        &self,
        membership: MembershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .memberships
                .insert(membership.identity_id, membership);
            Ok(())
        })
    }

    fn find_membership(
        &self,
        identity_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MembershipEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .memberships
                .get(&identity_id)
                .map(|entry| entry.value().clone()))
        })
    }

    fn replace_quizzes(
        &self,
        mut quizzes: Vec<QuizEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            quizzes.sort_by_key(|quiz| quiz.position);
            *store.inner.quizzes.write().await = quizzes;
            Ok(())
        })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.quizzes.read().await.clone()) })
    }

    fn read_start_flag(&self) -> BoxFuture<'static, StorageResult<StartFlagEntity>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.start_flag.read().await.clone()) })
    }

    fn write_start_flag(&self, flag: StartFlagEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            *store.inner.start_flag.write().await = flag;
            Ok(())
        })
    }

    fn try_insert_answer(
        &self,
        answer: AnswerEntity,
    ) -> BoxFuture<'static, StorageResult<AnswerInsert>> {
        let store = self.clone();
        Box::pin(async move {
            // Entry API gives an atomic check-and-insert per composite key, so
            // two racing submits for the same pair resolve to one record.
            match store.inner.answers.entry((answer.quiz_id, answer.team_id)) {
                Entry::Occupied(_) => Ok(AnswerInsert::Duplicate),
                Entry::Vacant(slot) => {
                    slot.insert(answer);
                    Ok(AnswerInsert::Created)
                }
            }
        })
    }

    fn find_answer(
        &self,
        quiz_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .answers
                .get(&(quiz_id, team_id))
                .map(|entry| entry.value().clone()))
        })
    }

    fn answers_for(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut answers: Vec<AnswerEntity> = store
                .inner
                .answers
                .iter()
                .filter(|entry| entry.key().0 == quiz_id)
                .map(|entry| entry.value().clone())
                .collect();
            answers.sort_by_key(|answer| answer.submitted_at);
            Ok(answers)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
