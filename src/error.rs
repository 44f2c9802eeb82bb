use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Every failure the service can report to a caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    NotFound(String),

    #[error("Email already in use.")]
    Conflict,

    #[error("Unable to authenticate")]
    Unauthenticated,

    #[error("Insufficient balance to purchase the shares.")]
    InsufficientFunds,

    #[error("Share {0} is not owned by this user")]
    ShareNotFound(String),

    #[error("Share {0} has already been sold")]
    AlreadySold(String),

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Store(String),

    #[error("Unable to hash the password: {0}")]
    Hash(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// HTTP status the boundary reports this error with.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Conflict
            | Error::InsufficientFunds
            | Error::ShareNotFound(_)
            | Error::AlreadySold(_)
            | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Store(_) | Error::Hash(_) | Error::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(e: mongodb::error::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<bson::ser::Error> for Error {
    fn from(e: bson::ser::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status(), Json(self.to_string())).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
