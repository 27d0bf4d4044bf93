use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use tokio_postgres::{NoTls, Row};

use super::{NoteRepository, RepositoryError, embedded::migrations};
use crate::models::{NewNote, Note};

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";

pub struct PostgresDatabase {
    dsn: String,
    pool: Pool,
}

impl PostgresDatabase {
    /// Builds the connection pool. Connections are opened lazily on first use.
    pub fn connect(dsn: &str, max_connections: usize) -> Result<Self, RepositoryError> {
        let pg_config: tokio_postgres::Config = dsn.parse()?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(max_connections)
            .runtime(Runtime::Tokio1)
            .build()?;

        Ok(Self {
            dsn: dsn.to_string(),
            pool,
        })
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        // refinery needs an owned client, so migrations run on a dedicated connection
        let (mut client, con) = tokio_postgres::connect(&self.dsn, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = con.await {
                tracing::error!("migration connection error: {}", e);
            }
        });

        let migrations_report = migrations::runner().run_async(&mut client).await?;

        for migration in migrations_report.applied_migrations() {
            tracing::info!(
                "Migration Applied -  Name: {}, Version: {}",
                migration.name(),
                migration.version()
            );
        }

        tracing::info!("DB migrations finished!");

        Ok(())
    }

    pub async fn session(&self) -> Result<PostgresSession, RepositoryError> {
        Ok(PostgresSession {
            client: self.pool.get().await?,
        })
    }
}

/// A pooled connection, handed back to the pool on drop.
pub struct PostgresSession {
    client: Object,
}

fn note_from_row(row: &Row) -> Result<Note, tokio_postgres::Error> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl NoteRepository for PostgresSession {
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Note>, RepositoryError> {
        let stmt = self
            .client
            .prepare_cached(&format!(
                "SELECT {NOTE_COLUMNS} FROM notes ORDER BY created_at DESC, id DESC OFFSET $1 LIMIT $2"
            ))
            .await?;

        let rows = self.client.query(&stmt, &[&skip, &limit]).await?;

        let mut notes = Vec::with_capacity(rows.len());
        for row in &rows {
            notes.push(note_from_row(row)?);
        }

        Ok(notes)
    }

    async fn find(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        let stmt = self
            .client
            .prepare_cached(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = $1"))
            .await?;

        let row = self.client.query_opt(&stmt, &[&id]).await?;

        Ok(row.as_ref().map(note_from_row).transpose()?)
    }

    async fn insert(&self, note: NewNote) -> Result<Note, RepositoryError> {
        let stmt = self
            .client
            .prepare_cached(&format!(
                "INSERT INTO notes (title, content, created_at, updated_at) VALUES ($1, $2, $3, $3) RETURNING {NOTE_COLUMNS}"
            ))
            .await?;

        let row = self
            .client
            .query_one(&stmt, &[&note.title, &note.content, &note.created_at])
            .await?;

        Ok(note_from_row(&row)?)
    }

    async fn save(&self, note: &Note) -> Result<Note, RepositoryError> {
        let stmt = self
            .client
            .prepare_cached(&format!(
                "UPDATE notes SET title = $1, content = $2, updated_at = $3 WHERE id = $4 RETURNING {NOTE_COLUMNS}"
            ))
            .await?;

        let row = self
            .client
            .query_opt(
                &stmt,
                &[&note.title, &note.content, &note.updated_at, &note.id],
            )
            .await?
            .ok_or(RepositoryError::NotFound(note.id))?;

        Ok(note_from_row(&row)?)
    }

    async fn remove(&self, note: &Note) -> Result<(), RepositoryError> {
        let rows = self
            .client
            .execute("DELETE FROM notes WHERE id = $1", &[&note.id])
            .await?;

        if rows == 0 {
            return Err(RepositoryError::NotFound(note.id));
        }

        Ok(())
    }
}
