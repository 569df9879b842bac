use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

use crate::i18n::Message;
use crate::validation::FieldErrors;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        match self {
            ApiError::Validation(errors) => builder.json(json!({
                "error": Message::InvalidInput.render(errors.locale()),
                "fields": errors,
            })),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => builder.json(json!({
                "error": msg
            })),
            ApiError::Database(err) => {
                log::error!("database failure: {}", err);
                builder.json(json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}
