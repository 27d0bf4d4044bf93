pub mod error;
pub mod extract;

use axum::{Json, extract::State, http::StatusCode};
use axum_macros::debug_handler;
use utoipa::OpenApi;

use crate::{
    app::AppState,
    dto::{
        CreateNoteRequest, HealthResponse, ListNotesQuery, NotePath, NoteResponse,
        UpdateNoteRequest,
    },
    service::NoteService,
};

use error::{ApiError, ErrorResponse, FieldError, ValidationErrorResponse};
use extract::{ValidJson, ValidPath, ValidQuery};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Personal Notes API",
        description = "Backend API for a personal notes manager. Provides CRUD endpoints for notes."
    ),
    paths(
        health_check,
        list_notes,
        create_note,
        get_note,
        update_note,
        delete_note
    ),
    components(schemas(
        NoteResponse,
        CreateNoteRequest,
        UpdateNoteRequest,
        HealthResponse,
        ErrorResponse,
        ValidationErrorResponse,
        FieldError
    )),
    tags(
        (name = "health", description = "Service health and diagnostics"),
        (name = "notes", description = "Operations for managing notes")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/",
    summary = "Health check",
    description = "Reports that the service is up.",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
#[debug_handler]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "Healthy".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/notes",
    summary = "List notes",
    description = "Retrieve a paginated list of notes ordered by creation time (newest first).",
    params(ListNotesQuery),
    responses(
        (status = 200, description = "Notes ordered newest first", body = Vec<NoteResponse>),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn list_notes(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<ListNotesQuery>,
) -> Result<Json<Vec<NoteResponse>>, ApiError> {
    let session = state.session().await?;
    let notes = NoteService::new(session.as_ref())
        .list_notes(query.skip, query.limit)
        .await?;

    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/notes",
    summary = "Create a note",
    description = "Create a new note with the provided title and optional content.",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), ApiError> {
    let session = state.session().await?;
    let note = NoteService::new(session.as_ref()).create_note(payload).await?;

    Ok((StatusCode::CREATED, Json(note.into())))
}

#[utoipa::path(
    get,
    path = "/notes/{note_id}",
    summary = "Get a note",
    description = "Get a single note by its unique identifier.",
    params(NotePath),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_note(
    State(state): State<AppState>,
    ValidPath(path): ValidPath<NotePath>,
) -> Result<Json<NoteResponse>, ApiError> {
    let session = state.session().await?;
    let note = NoteService::new(session.as_ref())
        .get_note(path.note_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(note.into()))
}

#[utoipa::path(
    put,
    path = "/notes/{note_id}",
    summary = "Update a note",
    description = "Update an existing note by its ID with the provided fields.",
    params(NotePath),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(state): State<AppState>,
    ValidPath(path): ValidPath<NotePath>,
    ValidJson(payload): ValidJson<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    let session = state.session().await?;
    let service = NoteService::new(session.as_ref());

    let existing = service
        .get_note(path.note_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    let note = service.update_note(existing, payload).await?;

    Ok(Json(note.into()))
}

#[utoipa::path(
    delete,
    path = "/notes/{note_id}",
    summary = "Delete a note",
    description = "Delete a note by its ID.",
    params(NotePath),
    responses(
        (status = 204, description = "Note deleted successfully"),
        (status = 404, description = "Note not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ValidationErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(state): State<AppState>,
    ValidPath(path): ValidPath<NotePath>,
) -> Result<StatusCode, ApiError> {
    let session = state.session().await?;
    let service = NoteService::new(session.as_ref());

    let existing = service
        .get_note(path.note_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    service.delete_note(existing).await?;

    Ok(StatusCode::NO_CONTENT)
}
