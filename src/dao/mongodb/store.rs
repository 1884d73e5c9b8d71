//! `QuizStore` implementation backed by MongoDB.

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoAnswerDocument, MongoMembershipDocument, MongoQuizDocument, MongoStartFlagDocument,
        MongoTeamDocument, START_FLAG_DOC_ID, doc_id, uuid_as_binary,
    },
};
use crate::dao::{
    models::{
        AnswerEntity, AnswerInsert, MembershipEntity, QuizEntity, StartFlagEntity, TeamEntity,
    },
    storage::StorageResult,
    store::QuizStore,
};

const TEAM_COLLECTION: &str = "teams";
const MEMBERSHIP_COLLECTION: &str = "team_memberships";
const QUIZ_COLLECTION: &str = "quizzes";
const GAME_STATE_COLLECTION: &str = "game_state";
const ANSWER_COLLECTION: &str = "answers";

/// MongoDB-backed store for the quiz round collections.
#[derive(Clone)]
pub struct MongoQuizStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoQuizStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // Quizzes are always read in sequence order.
        let quiz_collection = database.collection::<MongoQuizDocument>(QUIZ_COLLECTION);
        let quiz_index = mongodb::IndexModel::builder()
            .keys(doc! {"position": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("quiz_position_idx".to_owned()))
                    .build(),
            )
            .build();
        quiz_collection
            .create_index(quiz_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: QUIZ_COLLECTION,
                index: "position",
                source,
            })?;

        // Secondary guard on top of the composite `_id`: a unique index on
        // (quiz_id, team_id) keeps the at-most-one invariant visible in the
        // schema and covers per-quiz collation reads.
        let answer_collection = database.collection::<MongoAnswerDocument>(ANSWER_COLLECTION);
        let answer_index = mongodb::IndexModel::builder()
            .keys(doc! {"quiz_id": 1, "team_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("answer_pair_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        answer_collection
            .create_index(answer_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ANSWER_COLLECTION,
                index: "quiz_id,team_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn team_collection(&self) -> Collection<MongoTeamDocument> {
        self.database().await.collection(TEAM_COLLECTION)
    }

    async fn membership_collection(&self) -> Collection<MongoMembershipDocument> {
        self.database().await.collection(MEMBERSHIP_COLLECTION)
    }

    async fn quiz_collection(&self) -> Collection<MongoQuizDocument> {
        self.database().await.collection(QUIZ_COLLECTION)
    }

    async fn game_state_collection(&self) -> Collection<MongoStartFlagDocument> {
        self.database().await.collection(GAME_STATE_COLLECTION)
    }

    async fn answer_collection(&self) -> Collection<MongoAnswerDocument> {
        self.database().await.collection(ANSWER_COLLECTION)
    }

    async fn save_team(&self, team: TeamEntity) -> MongoResult<()> {
        let id = team.id;
        let document: MongoTeamDocument = team.into();
        self.team_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTeam { id, source })?;
        Ok(())
    }

    async fn find_team(&self, id: Uuid) -> MongoResult<Option<TeamEntity>> {
        let document = self
            .team_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "team",
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_teams(&self) -> MongoResult<Vec<TeamEntity>> {
        let documents: Vec<MongoTeamDocument> = self
            .team_collection()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "teams",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "teams",
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_membership(&self, membership: MembershipEntity) -> MongoResult<()> {
        let identity_id = membership.identity_id;
        let document: MongoMembershipDocument = membership.into();
        self.membership_collection()
            .await
            .replace_one(doc_id(identity_id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveMembership {
                identity_id,
                source,
            })?;
        Ok(())
    }

    async fn find_membership(&self, identity_id: Uuid) -> MongoResult<Option<MembershipEntity>> {
        let document = self
            .membership_collection()
            .await
            .find_one(doc_id(identity_id))
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "membership",
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn replace_quizzes(&self, quizzes: Vec<QuizEntity>) -> MongoResult<()> {
        let collection = self.quiz_collection().await;
        collection
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::ReplaceQuizzes { source })?;

        if quizzes.is_empty() {
            return Ok(());
        }

        let documents: Vec<MongoQuizDocument> = quizzes.into_iter().map(Into::into).collect();
        collection
            .insert_many(documents)
            .await
            .map_err(|source| MongoDaoError::ReplaceQuizzes { source })?;
        Ok(())
    }

    async fn list_quizzes(&self) -> MongoResult<Vec<QuizEntity>> {
        let documents: Vec<MongoQuizDocument> = self
            .quiz_collection()
            .await
            .find(doc! {})
            .sort(doc! {"position": 1})
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "quizzes",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "quizzes",
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn read_start_flag(&self) -> MongoResult<StartFlagEntity> {
        let document = self
            .game_state_collection()
            .await
            .find_one(doc! {"_id": START_FLAG_DOC_ID})
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "start flag",
                source,
            })?;
        Ok(document.map(Into::into).unwrap_or_default())
    }

    async fn write_start_flag(&self, flag: StartFlagEntity) -> MongoResult<()> {
        let document: MongoStartFlagDocument = flag.into();
        self.game_state_collection()
            .await
            .replace_one(doc! {"_id": START_FLAG_DOC_ID}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::WriteStartFlag { source })?;
        Ok(())
    }

    async fn try_insert_answer(&self, answer: AnswerEntity) -> MongoResult<AnswerInsert> {
        let quiz_id = answer.quiz_id;
        let team_id = answer.team_id;
        let document: MongoAnswerDocument = answer.into();

        match self.answer_collection().await.insert_one(&document).await {
            Ok(_) => Ok(AnswerInsert::Created),
            Err(err) if is_duplicate_key(&err) => Ok(AnswerInsert::Duplicate),
            Err(source) => Err(MongoDaoError::InsertAnswer {
                quiz_id,
                team_id,
                source,
            }),
        }
    }

    async fn find_answer(&self, quiz_id: Uuid, team_id: Uuid) -> MongoResult<Option<AnswerEntity>> {
        let filter = doc! {
            "quiz_id": uuid_as_binary(quiz_id),
            "team_id": uuid_as_binary(team_id),
        };
        let document = self
            .answer_collection()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "answer",
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn answers_for(&self, quiz_id: Uuid) -> MongoResult<Vec<AnswerEntity>> {
        let documents: Vec<MongoAnswerDocument> = self
            .answer_collection()
            .await
            .find(doc! {"quiz_id": uuid_as_binary(quiz_id)})
            .sort(doc! {"submitted_at": 1})
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "answers",
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Load {
                what: "answers",
                source,
            })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }
}

/// True when the driver error is a duplicate-key write rejection.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        &*err.kind,
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == 11000
    )
}

impl QuizStore for MongoQuizStore {
    fn save_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_team(team).await.map_err(Into::into) })
    }

    fn find_team(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_team(id).await.map_err(Into::into) })
    }

    fn list_teams(&self) -> BoxFuture<'static, StorageResult<Vec<TeamEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_teams().await.map_err(Into::into) })
    }

    fn save_membership(
        &self,
        membership: MembershipEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_membership(membership).await.map_err(Into::into) })
    }

    fn find_membership(
        &self,
        identity_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<MembershipEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_membership(identity_id).await.map_err(Into::into) })
    }

    fn replace_quizzes(
        &self,
        quizzes: Vec<QuizEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.replace_quizzes(quizzes).await.map_err(Into::into) })
    }

    fn list_quizzes(&self) -> BoxFuture<'static, StorageResult<Vec<QuizEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_quizzes().await.map_err(Into::into) })
    }

    fn read_start_flag(&self) -> BoxFuture<'static, StorageResult<StartFlagEntity>> {
        let store = self.clone();
        Box::pin(async move { store.read_start_flag().await.map_err(Into::into) })
    }

    fn write_start_flag(&self, flag: StartFlagEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write_start_flag(flag).await.map_err(Into::into) })
    }

    fn try_insert_answer(
        &self,
        answer: AnswerEntity,
    ) -> BoxFuture<'static, StorageResult<AnswerInsert>> {
        let store = self.clone();
        Box::pin(async move { store.try_insert_answer(answer).await.map_err(Into::into) })
    }

    fn find_answer(
        &self,
        quiz_id: Uuid,
        team_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_answer(quiz_id, team_id)
                .await
                .map_err(Into::into)
        })
    }

    fn answers_for(&self, quiz_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<AnswerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.answers_for(quiz_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
