use std::io;
use axum::{http::StatusCode, response::{IntoResponse, Response}};

/// Errors raised by the revision store and the markup layer
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// The page name fails the identifier grammar.
    #[error("invalid page name: {0:?}")]
    InvalidName(String),

    #[error("page not found")]
    NotFound,

    /// The operation is disallowed by policy (e.g. deleting the home page).
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Every number below the version bound is taken for this page.
    #[error("ran out of version numbers for page {name:?}")]
    VersionSpaceExhausted { name: String },
}

pub type WikiResult<T> = Result<T, WikiError>;

impl WikiError {
    /// True for failures of the underlying storage rather than of the request.
    pub fn is_storage_io(&self) -> bool {
        matches!(self, WikiError::Io(_) | WikiError::VersionSpaceExhausted { .. })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WikiError::InvalidName(_) => StatusCode::BAD_REQUEST,
            WikiError::NotFound => StatusCode::NOT_FOUND,
            WikiError::Forbidden(_) => StatusCode::FORBIDDEN,
            WikiError::Io(_) | WikiError::VersionSpaceExhausted { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WikiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            WikiError::NotFound => (status, "Wiki page not found").into_response(),
            WikiError::InvalidName(_) => (status, "Invalid page name").into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}
