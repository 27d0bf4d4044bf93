use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};

use std::{
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use super::{NoteRepository, RepositoryError};
use crate::models::{NewNote, Note};

const SCHEMA: &str = include_str!("../../migrations/sqlite/V1__create_notes.sql");
const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteDatabase {
    path: PathBuf,
}

impl SqliteDatabase {
    /// Creates missing parent directories and checks the file can be opened.
    pub async fn open(path: PathBuf) -> Result<Self, RepositoryError> {
        let database = Self { path };

        let path = database.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), RepositoryError> {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            open_connection(&path)?;
            Ok(())
        })
        .await??;

        Ok(database)
    }

    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), RepositoryError> {
            let conn = open_connection(&path)?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await??;

        tracing::info!("DB schema ready at {}", self.path.display());

        Ok(())
    }

    /// Opens a fresh connection for one request.
    pub async fn session(&self) -> Result<SqliteSession, RepositoryError> {
        let path = self.path.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&path)).await??;

        Ok(SqliteSession {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn open_connection(path: &std::path::Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // Readers and the single writer must not block each other across sessions.
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// A connection owned by a single request, closed on drop.
pub struct SqliteSession {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSession {
    async fn run<T, F>(&self, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| RepositoryError::Poisoned)?;
            f(&conn)
        })
        .await?
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    // Fixed width, so text order matches time order.
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn note_from_row(row: &Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: parse_timestamp(row, 3)?,
        updated_at: parse_timestamp(row, 4)?,
    })
}

#[async_trait]
impl NoteRepository for SqliteSession {
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Note>, RepositoryError> {
        self.run(move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {NOTE_COLUMNS} FROM notes ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let notes = stmt
                .query_map(params![limit, skip], note_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(notes)
        })
        .await
    }

    async fn find(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        self.run(move |conn| {
            let note = conn
                .query_row(
                    &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"),
                    params![id],
                    note_from_row,
                )
                .optional()?;
            Ok(note)
        })
        .await
    }

    async fn insert(&self, note: NewNote) -> Result<Note, RepositoryError> {
        self.run(move |conn| {
            let created_at = format_timestamp(&note.created_at);
            let note = conn.query_row(
                &format!(
                    "INSERT INTO notes (title, content, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) RETURNING {NOTE_COLUMNS}"
                ),
                params![note.title, note.content, created_at],
                note_from_row,
            )?;
            Ok(note)
        })
        .await
    }

    async fn save(&self, note: &Note) -> Result<Note, RepositoryError> {
        let note = note.clone();
        self.run(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4 RETURNING {NOTE_COLUMNS}"
                ),
                params![
                    note.title,
                    note.content,
                    format_timestamp(&note.updated_at),
                    note.id
                ],
                note_from_row,
            )
            .optional()?
            .ok_or(RepositoryError::NotFound(note.id))
        })
        .await
    }

    async fn remove(&self, note: &Note) -> Result<(), RepositoryError> {
        let id = note.id;
        self.run(move |conn| {
            let rows = conn.execute("DELETE FROM notes WHERE id = ?1", params![id])?;
            if rows == 0 {
                return Err(RepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}
