//! Domain service for accounts: CRUD, membership, and the document set.

use thiserror::Error;

use crate::db::AccountRepoError;
use crate::models::{Account, ServiceLevel};

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Could not be saved: {0}")]
    CouldNotBeSaved(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AccountRepoError> for AccountError {
    fn from(err: AccountRepoError) -> Self {
        match err {
            AccountRepoError::NotFound(_) | AccountRepoError::DocumentNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            AccountRepoError::DuplicateDocument(_) => Self::CouldNotBeSaved(err.to_string()),
            AccountRepoError::VersionConflict(_) => Self::Conflict(err.to_string()),
            AccountRepoError::CorruptServiceLevel(_) => Self::Internal(err.to_string()),
            AccountRepoError::Db(e) => Self::Database(e.to_string()),
        }
    }
}

impl From<sea_orm::DbErr> for AccountError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewAccountInput {
    pub name: String,
    pub owner_id: i64,
    pub service_level: ServiceLevel,
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdateInput {
    pub name: Option<String>,
    pub service_level: Option<ServiceLevel>,
}

#[derive(Debug, Clone)]
pub struct NewDocumentInput {
    pub name: String,
    pub extension: String,
    pub content: Vec<u8>,
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn create(&self, input: NewAccountInput) -> Result<Account, AccountError>;

    async fn update(
        &self,
        account_id: i64,
        input: AccountUpdateInput,
    ) -> Result<Account, AccountError>;

    async fn get(&self, account_id: i64) -> Result<Account, AccountError>;

    async fn get_by_name(&self, name: &str) -> Result<Account, AccountError>;

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Account>, AccountError>;

    async fn list_for_member(&self, user_id: i64) -> Result<Vec<Account>, AccountError>;

    /// Adds the user behind `email` to the account's member set.
    async fn add_member(&self, account_id: i64, email: &str) -> Result<Account, AccountError>;

    /// Attaches a document, rejecting names already present on the
    /// account, and announces the change to the members.
    async fn add_document(
        &self,
        account_id: i64,
        input: NewDocumentInput,
    ) -> Result<Account, AccountError>;

    /// Detaches and deletes the document carrying `name`, announcing the
    /// change to the members.
    async fn remove_document(&self, account_id: i64, name: &str)
    -> Result<Account, AccountError>;
}
