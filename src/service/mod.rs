use crate::{
    dto::{CreateNoteRequest, UpdateNoteRequest},
    models::{NewNote, Note, current_timestamp},
    repository::{NoteRepository, RepositoryError},
};

/// CRUD over one request's session.
pub struct NoteService<'a> {
    repo: &'a dyn NoteRepository,
}

impl<'a> NoteService<'a> {
    pub const fn new(repo: &'a dyn NoteRepository) -> Self {
        Self { repo }
    }

    pub async fn list_notes(&self, skip: i64, limit: i64) -> Result<Vec<Note>, RepositoryError> {
        self.repo.list(skip, limit).await
    }

    pub async fn get_note(&self, id: i64) -> Result<Option<Note>, RepositoryError> {
        self.repo.find(id).await
    }

    pub async fn create_note(&self, request: CreateNoteRequest) -> Result<Note, RepositoryError> {
        let note = self
            .repo
            .insert(NewNote {
                title: request.title,
                content: request.content,
                created_at: current_timestamp(),
            })
            .await?;

        tracing::debug!("created note {}", note.id);

        Ok(note)
    }

    /// `existing` must come from [`Self::get_note`] on the same session.
    pub async fn update_note(
        &self,
        existing: Note,
        request: UpdateNoteRequest,
    ) -> Result<Note, RepositoryError> {
        let changed = existing.patched(request.title, request.content, current_timestamp());
        self.repo.save(&changed).await
    }

    pub async fn delete_note(&self, existing: Note) -> Result<(), RepositoryError> {
        self.repo.remove(&existing).await?;

        tracing::debug!("deleted note {}", existing.id);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::repository::sqlite::SqliteDatabase;

    async fn database() -> (SqliteDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open(dir.path().join("notes.db")).await.unwrap();
        db.migrate().await.unwrap();
        (db, dir)
    }

    fn create(title: &str, content: Option<&str>) -> CreateNoteRequest {
        CreateNoteRequest {
            title: title.to_string(),
            content: content.map(ToString::to_string),
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_same_note() {
        let (db, _dir) = database().await;
        let session = db.session().await.unwrap();
        let service = NoteService::new(&session);

        let created = service
            .create_note(create("Groceries", Some("milk")))
            .await
            .unwrap();
        let fetched = service.get_note(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.title, "Groceries");
        assert_eq!(fetched.content.as_deref(), Some("milk"));
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn update_content_only_keeps_title_and_advances_updated_at() {
        let (db, _dir) = database().await;
        let session = db.session().await.unwrap();
        let service = NoteService::new(&session);

        let created = service.create_note(create("X", None)).await.unwrap();
        let updated = service
            .update_note(
                created.clone(),
                UpdateNoteRequest {
                    title: None,
                    content: Some("hi".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "X");
        assert_eq!(updated.content.as_deref(), Some("hi"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
    }

    #[tokio::test]
    async fn delete_removes_note() {
        let (db, _dir) = database().await;
        let session = db.session().await.unwrap();
        let service = NoteService::new(&session);

        let created = service.create_note(create("temp", None)).await.unwrap();
        service.delete_note(created.clone()).await.unwrap();

        assert!(service.get_note(created.id).await.unwrap().is_none());
    }
}
