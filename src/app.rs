use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::{
    config::CorsOrigins,
    handlers::rest,
    repository::{Database, RepositoryError, Session},
};

#[derive(Clone)]
pub struct AppState {
    database: Arc<Database>,
}

impl AppState {
    pub fn new(database: Database) -> Self {
        Self {
            database: Arc::new(database),
        }
    }

    /// Opens the session for the current request.
    pub async fn session(&self) -> Result<Session, RepositoryError> {
        self.database.session().await
    }
}

pub fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        // Credentials cannot be combined with a wildcard origin.
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsOrigins::List(list) => {
            let mut parsed = Vec::with_capacity(list.len());
            for origin in list {
                match HeaderValue::from_str(origin) {
                    Ok(value) => parsed.push(value),
                    Err(err) => tracing::warn!("ignoring invalid CORS origin '{origin}': {err}"),
                }
            }

            CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
                .allow_credentials(true)
        }
    }
}

pub fn router(state: AppState, origins: &CorsOrigins) -> Router {
    Router::new()
        .route("/", get(rest::health_check))
        .route("/notes", get(rest::list_notes).post(rest::create_note))
        .route(
            "/notes/{note_id}",
            get(rest::get_note)
                .put(rest::update_note)
                .delete(rest::delete_note),
        )
        .merge(SwaggerUi::new("/docs").url("/openapi.json", rest::ApiDoc::openapi()))
        .with_state(state)
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
}
