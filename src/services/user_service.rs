//! Domain service for user lookup and the password reset workflow.

use thiserror::Error;

use crate::models::User;

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Could not be saved: {0}")]
    CouldNotBeSaved(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for users.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn get_by_email(&self, email: &str) -> Result<User, UserError>;

    async fn get_by_id(&self, id: i64) -> Result<User, UserError>;

    async fn is_enabled(&self, email: &str) -> Result<bool, UserError>;

    /// Issues a reset token for the user behind `email` and announces the
    /// request. Unknown emails are an error; the HTTP layer turns that
    /// into a 404.
    async fn request_password_reset(&self, email: &str) -> Result<(), UserError>;

    /// Whether `token` exists and has not aged out. Deliberately blind to
    /// the used flag; only [`Self::change_password`] rejects replays.
    async fn is_valid_reset_token(&self, token: &str) -> Result<bool, UserError>;

    /// Replaces the password for `email`, guarded by a live reset token
    /// that belongs to that same user. An unknown token is a not-found
    /// error; a spent, expired, or foreign one is an invalid-token error.
    /// The token is burned on success.
    async fn change_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<User, UserError>;
}
