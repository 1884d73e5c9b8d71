use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB-layer operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Failures raised by the MongoDB backend.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// URI that failed to parse.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The client could not be built from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Initial connectivity ping never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Driver error from the last attempt.
        #[source]
        source: MongoError,
    },
    /// Health-check ping failed on an established connection.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A team document could not be written.
    #[error("failed to save team `{id}`")]
    SaveTeam {
        /// Team identifier.
        id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A membership document could not be written.
    #[error("failed to save membership for identity `{identity_id}`")]
    SaveMembership {
        /// Identity the membership belongs to.
        identity_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The quiz sequence could not be replaced.
    #[error("failed to replace the quiz sequence")]
    ReplaceQuizzes {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The start flag document could not be written.
    #[error("failed to write the start flag")]
    WriteStartFlag {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An answer document could not be inserted.
    #[error("failed to insert answer for quiz `{quiz_id}` team `{team_id}`")]
    InsertAnswer {
        /// Quiz identifier.
        quiz_id: Uuid,
        /// Team identifier.
        team_id: Uuid,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A read query failed.
    #[error("failed to load {what}")]
    Load {
        /// Description of the document(s) being read.
        what: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
