use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("{0}")]
    IO(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("{0}")]
    NotFound(String),

    /// Malformed caller input, nothing was processed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Nested output that cannot be serialized within a worker's stack.
    #[error("folder hierarchy is {0} levels deep, too deep to render")]
    TooDeep(usize),

    /// A write failed and its transaction was rolled back.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl IntoResponse for ShelfError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ShelfError::Auth(e) => e.into_response(),
            ShelfError::NotFound(e) => (StatusCode::NOT_FOUND, e).into_response(),
            ShelfError::InvalidInput(e) => (StatusCode::BAD_REQUEST, e).into_response(),
            ShelfError::Json(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            ShelfError::Persistence(e) => (StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
            ShelfError::TooDeep(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            ShelfError::IO(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            ShelfError::Database(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
            ShelfError::Migrate(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}
