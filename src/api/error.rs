use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::db::StoreError;
use crate::services::{AccountError, DesktopAuthError, KeyError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),

    TooManyRequests(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            Self::TooManyRequests(msg) => write!(f, "Too many requests: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            StoreError::UniqueViolation(what) => Self::Conflict(format!("{what} already exists")),
            StoreError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        let message = err.to_string();
        match err {
            AccountError::InvalidCredentials => Self::Unauthorized(message),
            AccountError::Blocked => Self::Forbidden(message),
            AccountError::NotFound => Self::NotFound(message),
            AccountError::UsernameTaken | AccountError::EmailTaken => Self::Conflict(message),
            AccountError::Validation(msg) => Self::ValidationError(msg),
            AccountError::Database(msg) => Self::DatabaseError(msg),
            AccountError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<KeyError> for ApiError {
    fn from(err: KeyError) -> Self {
        let message = err.to_string();
        match err {
            KeyError::NotFound | KeyError::AccountNotFound => Self::NotFound(message),
            KeyError::AlreadyClaimed => Self::Conflict(message),
            KeyError::Inactive | KeyError::Expired => Self::ValidationError(message),
            KeyError::Validation(msg) => Self::ValidationError(msg),
            KeyError::Collision(_) => Self::InternalError(message),
            KeyError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<DesktopAuthError> for ApiError {
    fn from(err: DesktopAuthError) -> Self {
        match err {
            DesktopAuthError::Database(msg) => Self::DatabaseError(msg),
            DesktopAuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    #[must_use]
    pub fn not_authenticated() -> Self {
        Self::Unauthorized("Not authenticated".to_string())
    }

    #[must_use]
    pub fn too_many_attempts() -> Self {
        Self::TooManyRequests("Too many failed attempts, try again later".to_string())
    }
}
