use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::api::{ErrorMessage, ErrorResponse};
use crate::books_repository::BookRepositoryError;

/// Every failure a handler can return, rendered as `{message, status}`
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid payload: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Persistence(BookRepositoryError),
}

impl From<BookRepositoryError> for ApiError {
    fn from(err: BookRepositoryError) -> Self {
        match err {
            BookRepositoryError::NotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Persistence(other),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed {}", self);
        } else {
            tracing::info!("Request rejected with {}: {}", status, self);
        }

        let message = match self {
            ApiError::Validation(errors) => ErrorMessage::List(errors.clone()),
            other => ErrorMessage::Single(other.to_string()),
        };
        HttpResponse::build(status).json(ErrorResponse {
            message,
            status: status.as_u16(),
        })
    }
}
