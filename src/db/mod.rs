use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{
    accounts, auth_groups, confirmation_tokens, documents, password_reset_tokens, users,
};
use crate::models::Account;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{AccountRepoError, AccountUpdate, NewAccount};
pub use repositories::document::NewDocument;
pub use repositories::registration::{Registration, RegistrationError};
pub use repositories::user::NewUser;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn document_repo(&self) -> repositories::document::DocumentRepository {
        repositories::document::DocumentRepository::new(self.conn.clone())
    }

    fn auth_group_repo(&self) -> repositories::auth_group::AuthGroupRepository {
        repositories::auth_group::AuthGroupRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn set_user_enabled(&self, user_id: i64, enabled: bool) -> Result<users::Model> {
        self.user_repo().set_enabled(user_id, enabled).await
    }

    /// Password update and token burn in one transaction; `None` when no
    /// user carries `email`.
    pub async fn change_user_password(
        &self,
        email: &str,
        password_hash: String,
        reset_token_id: i64,
    ) -> Result<Option<users::Model>> {
        repositories::user::change_password_with_token(
            &self.conn,
            email,
            password_hash,
            reset_token_id,
        )
        .await
    }

    // Registration

    pub async fn register(
        &self,
        registration: Registration,
    ) -> Result<(users::Model, confirmation_tokens::Model), RegistrationError> {
        repositories::registration::register(&self.conn, registration).await
    }

    // Tokens

    pub async fn find_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<confirmation_tokens::Model>> {
        self.token_repo().find_confirmation(token).await
    }

    pub async fn delete_confirmation_token(&self, id: i64) -> Result<()> {
        self.token_repo().delete_confirmation(id).await
    }

    pub async fn delete_expired_confirmation_tokens(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.token_repo()
            .delete_expired_confirmations(cutoff)
            .await
    }

    pub async fn create_password_reset_token(
        &self,
        user_id: i64,
    ) -> Result<password_reset_tokens::Model> {
        self.token_repo().create_password_reset(user_id).await
    }

    pub async fn find_password_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<password_reset_tokens::Model>> {
        self.token_repo().find_password_reset(token).await
    }

    // Accounts

    pub async fn account_exists_by_name(&self, name: &str) -> Result<bool> {
        self.account_repo().exists_by_name(name).await
    }

    pub async fn get_account_by_id(&self, id: i64) -> Result<Option<accounts::Model>> {
        self.account_repo().get_by_id(id).await
    }

    pub async fn get_account_by_name(&self, name: &str) -> Result<Option<accounts::Model>> {
        self.account_repo().get_by_name(name).await
    }

    pub async fn get_accounts_by_owner(&self, owner_id: i64) -> Result<Vec<accounts::Model>> {
        self.account_repo().get_by_owner(owner_id).await
    }

    pub async fn get_accounts_for_member(&self, user_id: i64) -> Result<Vec<accounts::Model>> {
        self.account_repo().get_for_member(user_id).await
    }

    pub async fn insert_account(&self, new: NewAccount) -> Result<accounts::Model> {
        self.account_repo().insert(new).await
    }

    pub async fn add_account_member(&self, account_id: i64, user_id: i64) -> Result<()> {
        self.account_repo().add_member(account_id, user_id).await
    }

    pub async fn update_account(
        &self,
        account_id: i64,
        update: AccountUpdate,
    ) -> Result<Option<accounts::Model>> {
        self.account_repo().update(account_id, update).await
    }

    pub async fn load_account(&self, account: accounts::Model) -> Result<Account> {
        self.account_repo().load_full(account).await
    }

    pub async fn account_members(&self, account_id: i64) -> Result<Vec<users::Model>> {
        self.account_repo().members(account_id).await
    }

    pub async fn add_document_to_account(
        &self,
        account_id: i64,
        new: NewDocument,
    ) -> Result<Account, AccountRepoError> {
        self.account_repo().add_document(account_id, new).await
    }

    pub async fn remove_document_from_account(
        &self,
        account_id: i64,
        name: String,
    ) -> Result<Account, AccountRepoError> {
        self.account_repo().remove_document(account_id, name).await
    }

    // Documents

    pub async fn get_document_by_id(&self, id: i64) -> Result<Option<documents::Model>> {
        self.document_repo().get_by_id(id).await
    }

    pub async fn get_document_by_name(&self, name: &str) -> Result<Option<documents::Model>> {
        self.document_repo().get_by_name(name).await
    }

    pub async fn insert_document(&self, new: NewDocument) -> Result<documents::Model> {
        self.document_repo().insert(new).await
    }

    pub async fn delete_document(&self, id: i64) -> Result<bool> {
        self.document_repo().delete_by_id(id).await
    }

    // Auth groups

    pub async fn auth_groups_for_username(&self, username: &str) -> Result<Vec<auth_groups::Model>> {
        self.auth_group_repo().find_by_username(username).await
    }
}
