use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::account_service::AccountError;
use crate::services::document_service::DocumentError;
use crate::services::register_service::RegisterError;
use crate::services::user_service::UserError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    CouldNotBeSaved(String),

    InvalidToken(String),

    ValidationError(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::CouldNotBeSaved(msg) => write!(f, "Could not be saved: {msg}"),
            Self::InvalidToken(msg) => write!(f, "Invalid token: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::CouldNotBeSaved(msg) | Self::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::InvalidToken(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<RegisterError> for ApiError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::CouldNotBeSaved(msg) => Self::CouldNotBeSaved(msg),
            RegisterError::Database(msg) => Self::DatabaseError(msg),
            RegisterError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(msg) => Self::NotFound(msg),
            UserError::InvalidToken(msg) => Self::InvalidToken(msg),
            UserError::CouldNotBeSaved(msg) => Self::CouldNotBeSaved(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(msg) => Self::NotFound(msg),
            AccountError::CouldNotBeSaved(msg) => Self::CouldNotBeSaved(msg),
            AccountError::Conflict(msg) => Self::Conflict(msg),
            AccountError::Database(msg) => Self::DatabaseError(msg),
            AccountError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(msg) => Self::NotFound(msg),
            DocumentError::CouldNotBeSaved(msg) => Self::CouldNotBeSaved(msg),
            DocumentError::Database(msg) => Self::DatabaseError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AccountRepoError;

    #[test]
    fn version_conflict_surfaces_as_409() {
        let err = ApiError::from(AccountError::from(AccountRepoError::VersionConflict(7)));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_reset_token_surfaces_as_404() {
        let err = ApiError::from(UserError::NotFound("no such token".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
