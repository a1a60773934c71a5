use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

const OPAQUE_SERVER_ERROR: &str = "Internal server error. Please try again later.";

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) | AppError::Template(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                OPAQUE_SERVER_ERROR.to_string()
            }
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                OPAQUE_SERVER_ERROR.to_string()
            }
            AppError::Template(ref e) => {
                tracing::error!("Template rendering failed: {:?}", e);
                OPAQUE_SERVER_ERROR.to_string()
            }
            AppError::Jwt(ref e) => {
                tracing::debug!("JWT rejected: {:?}", e);
                "Invalid token".to_string()
            }
            AppError::Validation(message)
            | AppError::Authentication(message)
            | AppError::Authorization(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::BadRequest(message) => message,
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

// Validation helper
fn field_messages(errors: &validator::ValidationErrors, prefix: &str) -> Vec<String> {
    let mut messages = Vec::new();

    for (field, kind) in errors.errors() {
        match kind {
            validator::ValidationErrorsKind::Field(field_errors) => {
                messages.extend(field_errors.iter().map(|error| {
                    format!(
                        "{}{}: {}",
                        prefix,
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                }));
            }
            // Nested structs (e.g. profile urls) report under their parent field.
            validator::ValidationErrorsKind::Struct(nested) => {
                messages.extend(field_messages(nested, &format!("{}{}.", prefix, field)));
            }
            validator::ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    messages.extend(field_messages(
                        nested,
                        &format!("{}{}[{}].", prefix, field, index),
                    ));
                }
            }
        }
    }

    messages
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut error_messages = field_messages(&errors, "");
        error_messages.sort();
        AppError::Validation(error_messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 3, message = "too short"))]
        title: String,
    }

    #[test]
    fn validation_errors_keep_field_and_message() {
        let err = Probe {
            title: "a".to_string(),
        }
        .validate()
        .unwrap_err();

        match AppError::from(err) {
            AppError::Validation(message) => assert_eq!(message, "title: too short"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[derive(Validate)]
    struct Links {
        #[validate(length(min = 5, message = "bad github"))]
        github: String,
        #[validate(length(min = 5, message = "bad facebook"))]
        facebook: String,
    }

    #[derive(Validate)]
    struct Profile {
        #[validate(nested)]
        urls: Links,
    }

    #[test]
    fn every_nested_message_keeps_its_parent_field() {
        let err = Profile {
            urls: Links {
                github: "x".to_string(),
                facebook: "y".to_string(),
            },
        }
        .validate()
        .unwrap_err();

        match AppError::from(err) {
            AppError::Validation(message) => assert_eq!(
                message,
                "urls.facebook: bad facebook, urls.github: bad github"
            ),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn statuses_distinguish_authentication_from_authorization() {
        assert_eq!(
            AppError::Authentication("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Authorization("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
