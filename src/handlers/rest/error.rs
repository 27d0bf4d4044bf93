use axum::{
    Json,
    extract::{
        path::ErrorKind,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::repository::RepositoryError;

/// One offending input field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FieldError {
    /// Where the error was found, e.g. `["body", "title"]`
    pub loc: Vec<String>,
    /// Human readable description
    pub msg: String,
    /// Machine readable error kind
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidationErrorResponse {
    pub detail: Vec<FieldError>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Note not found")]
    NotFound,

    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error("persistence layer unavailable: {0}")]
    Unavailable(RepositoryError),

    /// A request axum refused before it could be validated, e.g. an
    /// oversized body. Answered with the rejection's own status.
    #[error("request rejected: {detail}")]
    Rejected { status: StatusCode, detail: String },
}

impl ApiError {
    fn invalid(loc: &[&str], msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            loc: loc.iter().map(ToString::to_string).collect(),
            msg: msg.into(),
            kind: kind.into(),
        }])
    }

    /// Flattens `validator` output into field errors under `source`
    /// ("body", "query" or "path").
    pub fn from_validation(source: &str, errors: &ValidationErrors) -> Self {
        let mut detail: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |error| FieldError {
                    loc: vec![source.to_string(), field.clone()],
                    msg: error.message.as_ref().map_or_else(
                        || format!("{field} failed '{}' validation", error.code),
                        ToString::to_string,
                    ),
                    kind: error.code.to_string(),
                })
            })
            .collect();

        detail.sort_by(|a, b| a.loc.cmp(&b.loc));

        Self::Validation(detail)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(_) => Self::NotFound,
            other => Self::Unavailable(other),
        }
    }
}

// serde reports "missing field `title`"; pull the name out so `loc` can point at it.
fn missing_field(text: &str) -> Option<&str> {
    text.split("missing field `").nth(1)?.split('`').next()
}

// Deserialization errors read "<prefix><field.path>: <reason>" when the
// failing value sits below the top level.
fn field_path<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let (path, _) = text.strip_prefix(prefix)?.split_once(": ")?;
    (!path.is_empty() && !path.contains(char::is_whitespace)).then_some(path)
}

fn located<'a>(source: &'a str, path: Option<&'a str>) -> Vec<&'a str> {
    let mut loc = vec![source];
    loc.extend(path.into_iter().flat_map(|path| path.split('.')));
    loc
}

const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const QUERY_PREFIX: &str = "Failed to deserialize query string: ";

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let text = rejection.body_text();

        // Size limits and unreadable bodies are not validation failures.
        if let JsonRejection::BytesRejection(_) = rejection {
            return Self::Rejected {
                status: rejection.status(),
                detail: text,
            };
        }

        if let Some(field) = missing_field(&text) {
            return Self::invalid(&["body", field], format!("Field required: {field}"), "missing");
        }

        let kind = match rejection {
            JsonRejection::JsonDataError(_) => "value_error",
            JsonRejection::JsonSyntaxError(_) => "json_invalid",
            JsonRejection::MissingJsonContentType(_) => "content_type",
            _ => "body_error",
        };

        let loc = located("body", field_path(&text, JSON_DATA_PREFIX));
        Self::invalid(&loc, text.clone(), kind)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        let text = rejection.body_text();
        let loc = located("query", field_path(&text, QUERY_PREFIX));
        Self::invalid(&loc, text.clone(), "query_invalid")
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        let key = match &rejection {
            PathRejection::FailedToDeserializePathParams(err) => match err.kind() {
                ErrorKind::ParseErrorAtKey { key, .. }
                | ErrorKind::InvalidUtf8InPathParam { key }
                | ErrorKind::DeserializeError { key, .. } => Some(key.as_str()),
                _ => None,
            },
            _ => None,
        };

        Self::invalid(&located("path", key), rejection.body_text(), "path_invalid")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    detail: "Note not found".to_string(),
                }),
            )
                .into_response(),
            Self::Validation(detail) => {
                tracing::debug!("rejected request: {:?}", detail);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorResponse { detail }),
                )
                    .into_response()
            }
            Self::Rejected { status, detail } => {
                tracing::debug!("rejected request body: {}", detail);
                (status, Json(ErrorResponse { detail })).into_response()
            }
            Self::Unavailable(e) => {
                tracing::error!("persistence layer unavailable: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorResponse {
                        detail: "Service unavailable".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use validator::Validate;

    use crate::dto::ListNotesQuery;

    #[test]
    fn extracts_missing_field_name() {
        assert_eq!(
            missing_field(
                "Failed to deserialize the JSON body into the target type: missing field `title` at line 1 column 2"
            ),
            Some("title")
        );
        assert_eq!(missing_field("expected value at line 1 column 1"), None);
    }

    #[test]
    fn extracts_field_path_of_type_errors() {
        assert_eq!(
            field_path(
                "Failed to deserialize the JSON body into the target type: content: invalid type: integer `5`, expected a string at line 1 column 25",
                JSON_DATA_PREFIX
            ),
            Some("content")
        );
        assert_eq!(
            field_path(
                "Failed to deserialize query string: limit: invalid digit found in string",
                QUERY_PREFIX
            ),
            Some("limit")
        );
        assert_eq!(
            field_path(
                "Failed to deserialize the JSON body into the target type: invalid type: integer `1`, expected struct CreateNoteRequest at line 1 column 1",
                JSON_DATA_PREFIX
            ),
            None
        );
        assert_eq!(located("body", Some("tags.0")), ["body", "tags", "0"]);
        assert_eq!(located("query", None), ["query"]);
    }

    #[test]
    fn validation_errors_are_located_and_sorted() {
        let errors = ListNotesQuery { skip: -1, limit: 0 }.validate().unwrap_err();

        let ApiError::Validation(detail) = ApiError::from_validation("query", &errors) else {
            panic!("expected validation error");
        };

        let locs: Vec<_> = detail.iter().map(|e| e.loc.join(".")).collect();
        assert_eq!(locs, ["query.limit", "query.skip"]);
        assert_eq!(detail[0].msg, "limit must be between 1 and 1000");
        assert_eq!(detail[0].kind, "range");
    }

    #[test]
    fn vanished_rows_map_to_not_found() {
        assert!(matches!(
            ApiError::from(RepositoryError::NotFound(7)),
            ApiError::NotFound
        ));
        assert!(matches!(
            ApiError::from(RepositoryError::Poisoned),
            ApiError::Unavailable(_)
        ));
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Validation(Vec::new()).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Unavailable(RepositoryError::Poisoned)
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::Rejected {
                status: StatusCode::PAYLOAD_TOO_LARGE,
                detail: "length limit exceeded".to_string(),
            }
            .into_response()
            .status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }
}
