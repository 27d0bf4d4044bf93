mod embedded;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;

use crate::{
    config::DatabaseUrl,
    models::{NewNote, Note},
};

use postgres::PostgresDatabase;
use sqlite::SqliteDatabase;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("note {0} no longer exists")]
    NotFound(i64),

    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to acquire connection from pool: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("failed to build connection pool: {0}")]
    PoolBuild(#[from] deadpool_postgres::BuildError),

    #[error("migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("sqlite connection lock poisoned")]
    Poisoned,

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Note storage operations available on an open session.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Newest first, ties broken by id.
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Note>, RepositoryError>;

    async fn find(&self, id: i64) -> Result<Option<Note>, RepositoryError>;

    async fn insert(&self, note: NewNote) -> Result<Note, RepositoryError>;

    /// Persists title, content and `updated_at` of an existing row.
    async fn save(&self, note: &Note) -> Result<Note, RepositoryError>;

    async fn remove(&self, note: &Note) -> Result<(), RepositoryError>;
}

/// Per-request handle to the store. Dropping it releases the connection.
pub type Session = Box<dyn NoteRepository>;

/// Session factory for whichever backend the configuration selected.
pub enum Database {
    Postgres(PostgresDatabase),
    Sqlite(SqliteDatabase),
}

impl Database {
    pub async fn connect(
        url: &DatabaseUrl,
        max_connections: usize,
    ) -> Result<Self, RepositoryError> {
        let database = match url {
            DatabaseUrl::Postgres(dsn) => {
                Self::Postgres(PostgresDatabase::connect(dsn, max_connections)?)
            }
            DatabaseUrl::Sqlite(path) => Self::Sqlite(SqliteDatabase::open(path.clone()).await?),
        };

        tracing::info!("Using {} for note storage", url);

        Ok(database)
    }

    /// Creates the notes table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        match self {
            Self::Postgres(db) => db.migrate().await,
            Self::Sqlite(db) => db.migrate().await,
        }
    }

    pub async fn session(&self) -> Result<Session, RepositoryError> {
        let session: Session = match self {
            Self::Postgres(db) => Box::new(db.session().await?),
            Self::Sqlite(db) => Box::new(db.session().await?),
        };

        Ok(session)
    }
}
