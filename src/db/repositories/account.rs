use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use thiserror::Error;

use crate::db::repositories::document::NewDocument;
use crate::entities::{account_users, accounts, documents, users};
use crate::models::{Account, Document, ServiceLevel, User};

/// Failures from the document read-modify-write path. Everything else in
/// this repository reports through `anyhow` like its siblings; these are
/// separate because callers branch on them.
#[derive(Debug, Error)]
pub enum AccountRepoError {
    #[error("Account {0} not found")]
    NotFound(i64),
    #[error("Document \"{0}\" is already attached to this account")]
    DuplicateDocument(String),
    #[error("Document \"{0}\" is not attached to this account")]
    DocumentNotFound(String),
    #[error("Account {0} was modified concurrently")]
    VersionConflict(i64),
    #[error("Unknown service level \"{0}\" stored for account")]
    CorruptServiceLevel(String),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub owner_id: i64,
    pub service_level: ServiceLevel,
}

#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub service_level: Option<ServiceLevel>,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool> {
        exists_by_name(&self.conn, name).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<accounts::Model>> {
        accounts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<accounts::Model>> {
        accounts::Entity::find()
            .filter(accounts::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("Failed to query account by name")
    }

    pub async fn get_by_owner(&self, owner_id: i64) -> Result<Vec<accounts::Model>> {
        accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id))
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query accounts by owner")
    }

    /// Accounts a user belongs to through the membership table.
    pub async fn get_for_member(&self, user_id: i64) -> Result<Vec<accounts::Model>> {
        let account_ids: Vec<i64> = account_users::Entity::find()
            .filter(account_users::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to query account memberships")?
            .into_iter()
            .map(|row| row.account_id)
            .collect();

        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(account_ids))
            .order_by_asc(accounts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query accounts by membership")
    }

    pub async fn insert(&self, new: NewAccount) -> Result<accounts::Model> {
        insert_account(&self.conn, &new).await
    }

    pub async fn add_member(&self, account_id: i64, user_id: i64) -> Result<()> {
        add_member(&self.conn, account_id, user_id).await
    }

    pub async fn update(
        &self,
        account_id: i64,
        update: AccountUpdate,
    ) -> Result<Option<accounts::Model>> {
        let Some(account) = self.get_by_id(account_id).await? else {
            return Ok(None);
        };

        let mut active: accounts::ActiveModel = account.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(level) = update.service_level {
            active.service_level = Set(level.as_str().to_string());
        }

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update account")?;
        Ok(Some(updated))
    }

    /// Resolves the member and document sets for an account row.
    pub async fn load_full(&self, account: accounts::Model) -> Result<Account> {
        load_full(&self.conn, account)
            .await
            .context("Failed to resolve account members and documents")
    }

    pub async fn members(&self, account_id: i64) -> Result<Vec<users::Model>> {
        members(&self.conn, account_id).await
    }

    /// Attaches a document to the account. The duplicate-name scan, the
    /// insert, and the version bump run in one transaction; a version
    /// mismatch means another writer got in between the read and the bump.
    pub async fn add_document(
        &self,
        account_id: i64,
        new: NewDocument,
    ) -> Result<Account, AccountRepoError> {
        let outcome = self
            .conn
            .transaction::<_, Account, AccountRepoError>(|txn| {
                Box::pin(async move {
                    let account = accounts::Entity::find_by_id(account_id)
                        .one(txn)
                        .await?
                        .ok_or(AccountRepoError::NotFound(account_id))?;
                    let expected_version = account.version;

                    let existing = documents::Entity::find()
                        .filter(documents::Column::AccountId.eq(account_id))
                        .filter(documents::Column::Name.eq(new.name.clone()))
                        .count(txn)
                        .await?;
                    if existing > 0 {
                        return Err(AccountRepoError::DuplicateDocument(new.name));
                    }

                    let active = documents::ActiveModel {
                        name: Set(new.name),
                        extension: Set(new.extension),
                        content: Set(new.content),
                        account_id: Set(Some(account_id)),
                        created_at: Set(chrono::Utc::now().to_rfc3339()),
                        ..Default::default()
                    };
                    active.insert(txn).await?;

                    bump_version(txn, account_id, expected_version).await?;

                    let account = accounts::Entity::find_by_id(account_id)
                        .one(txn)
                        .await?
                        .ok_or(AccountRepoError::NotFound(account_id))?;
                    load_full_strict(txn, account).await
                })
            })
            .await;

        flatten_txn(outcome)
    }

    /// Detaches the document carrying `name` from the account and deletes
    /// its row, under the same version guard as [`Self::add_document`].
    pub async fn remove_document(
        &self,
        account_id: i64,
        name: String,
    ) -> Result<Account, AccountRepoError> {
        let outcome = self
            .conn
            .transaction::<_, Account, AccountRepoError>(|txn| {
                Box::pin(async move {
                    let account = accounts::Entity::find_by_id(account_id)
                        .one(txn)
                        .await?
                        .ok_or(AccountRepoError::NotFound(account_id))?;
                    let expected_version = account.version;

                    let doc = documents::Entity::find()
                        .filter(documents::Column::AccountId.eq(account_id))
                        .filter(documents::Column::Name.eq(name.clone()))
                        .one(txn)
                        .await?
                        .ok_or(AccountRepoError::DocumentNotFound(name))?;

                    documents::Entity::delete_by_id(doc.id).exec(txn).await?;

                    bump_version(txn, account_id, expected_version).await?;

                    let account = accounts::Entity::find_by_id(account_id)
                        .one(txn)
                        .await?
                        .ok_or(AccountRepoError::NotFound(account_id))?;
                    load_full_strict(txn, account).await
                })
            })
            .await;

        flatten_txn(outcome)
    }
}

fn flatten_txn<T>(
    outcome: Result<T, TransactionError<AccountRepoError>>,
) -> Result<T, AccountRepoError> {
    match outcome {
        Ok(value) => Ok(value),
        Err(TransactionError::Connection(e)) => Err(AccountRepoError::Db(e)),
        Err(TransactionError::Transaction(e)) => Err(e),
    }
}

async fn bump_version<C: ConnectionTrait>(
    db: &C,
    account_id: i64,
    expected_version: i64,
) -> Result<(), AccountRepoError> {
    let result = accounts::Entity::update_many()
        .col_expr(accounts::Column::Version, Expr::value(expected_version + 1))
        .filter(accounts::Column::Id.eq(account_id))
        .filter(accounts::Column::Version.eq(expected_version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AccountRepoError::VersionConflict(account_id));
    }
    Ok(())
}

pub async fn exists_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<bool> {
    let count = accounts::Entity::find()
        .filter(accounts::Column::Name.eq(name))
        .count(db)
        .await
        .context("Failed to count accounts by name")?;
    Ok(count > 0)
}

pub async fn insert_account<C: ConnectionTrait>(
    db: &C,
    new: &NewAccount,
) -> Result<accounts::Model> {
    let active = accounts::ActiveModel {
        name: Set(new.name.clone()),
        owner_id: Set(new.owner_id),
        service_level: Set(new.service_level.as_str().to_string()),
        version: Set(0),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    active.insert(db).await.context("Failed to insert account")
}

pub async fn add_member<C: ConnectionTrait>(db: &C, account_id: i64, user_id: i64) -> Result<()> {
    let active = account_users::ActiveModel {
        account_id: Set(account_id),
        user_id: Set(user_id),
        ..Default::default()
    };
    active
        .insert(db)
        .await
        .context("Failed to insert account membership")?;
    Ok(())
}

pub async fn members<C: ConnectionTrait>(db: &C, account_id: i64) -> Result<Vec<users::Model>> {
    let user_ids: Vec<i64> = account_users::Entity::find()
        .filter(account_users::Column::AccountId.eq(account_id))
        .all(db)
        .await
        .context("Failed to query account memberships")?
        .into_iter()
        .map(|row| row.user_id)
        .collect();

    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    users::Entity::find()
        .filter(users::Column::Id.is_in(user_ids))
        .order_by_asc(users::Column::Id)
        .all(db)
        .await
        .context("Failed to query account members")
}

pub async fn load_full<C: ConnectionTrait>(db: &C, account: accounts::Model) -> Result<Account> {
    load_full_strict(db, account).await.map_err(Into::into)
}

async fn load_full_strict<C: ConnectionTrait>(
    db: &C,
    account: accounts::Model,
) -> Result<Account, AccountRepoError> {
    let service_level = ServiceLevel::parse(&account.service_level)
        .ok_or_else(|| AccountRepoError::CorruptServiceLevel(account.service_level.clone()))?;

    let member_rows = account_users::Entity::find()
        .filter(account_users::Column::AccountId.eq(account.id))
        .all(db)
        .await?;
    let user_ids: Vec<i64> = member_rows.into_iter().map(|row| row.user_id).collect();

    let users = if user_ids.is_empty() {
        Vec::new()
    } else {
        users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .order_by_asc(users::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(User::from)
            .collect()
    };

    let documents = documents::Entity::find()
        .filter(documents::Column::AccountId.eq(account.id))
        .order_by_asc(documents::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Document::from)
        .collect();

    Ok(Account {
        id: account.id,
        name: account.name,
        owner_id: account.owner_id,
        service_level,
        users,
        documents,
    })
}
