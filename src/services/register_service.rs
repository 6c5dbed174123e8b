//! Domain service for the registration workflow.
//!
//! Covers the initial sign-up (user, role binding, account, and the
//! confirmation token, saved atomically) and the later activation when the
//! user follows the emailed confirmation link.

use serde::Deserialize;
use thiserror::Error;

use crate::db::RegistrationError;
use crate::models::{Role, ServiceLevel, User};

/// Errors specific to registration operations.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("Could not be saved: {0}")]
    CouldNotBeSaved(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RegistrationError> for RegisterError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::DuplicateEmail(_) | RegistrationError::DuplicateAccountName(_) => {
                Self::CouldNotBeSaved(err.to_string())
            }
            RegistrationError::Db(e) => Self::Database(e.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for RegisterError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RegisterError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Sign-up payload: the user, the account it will own, and optionally the
/// role it starts with.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub user: NewUserRequest,
    pub account: NewAccountRequest,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountRequest {
    pub name: String,
    pub service_level: ServiceLevel,
}

/// Domain service trait for registration.
#[async_trait::async_trait]
pub trait RegisterService: Send + Sync {
    /// Creates the user (disabled), its role binding, its account, and a
    /// confirmation token, then announces the registration.
    async fn register(&self, request: RegistrationRequest) -> Result<User, RegisterError>;

    /// Activates the account behind `token`. Returns `false` when the
    /// token is unknown or past its expiry; the caller cannot tell the
    /// two apart, the log can.
    async fn activate(&self, token: &str) -> Result<bool, RegisterError>;
}
