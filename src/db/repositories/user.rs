use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionError, TransactionTrait,
};
use tokio::task;

use crate::db::repositories::token;
use crate::entities::users;

/// Input for creating a user row. The password arrives already hashed;
/// hashing happens off the async runtime via [`hash_password_blocking`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<users::Model>> {
        find_by_email(&self.conn, email).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn set_enabled(&self, user_id: i64, enabled: bool) -> Result<users::Model> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?
            .with_context(|| format!("User {user_id} not found"))?;

        let mut active: users::ActiveModel = user.into();
        active.enabled = Set(enabled);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        active
            .update(&self.conn)
            .await
            .context("Failed to update user enabled flag")
    }
}

/// Replaces the stored hash for `email` and flags the reset token that
/// authorized the change, both in one transaction so a spent token can
/// never guard a password that was not actually replaced (nor the other
/// way around). Returns the updated row, or `None` if no user carries
/// that email.
pub async fn change_password_with_token(
    conn: &DatabaseConnection,
    email: &str,
    password_hash: String,
    reset_token_id: i64,
) -> Result<Option<users::Model>> {
    let email = email.to_string();
    let outcome = conn
        .transaction::<_, Option<users::Model>, sea_orm::DbErr>(|txn| {
            Box::pin(async move {
                let Some(updated) = update_password(txn, &email, password_hash)
                    .await
                    .map_err(db_err)?
                else {
                    return Ok(None);
                };

                token::mark_password_reset_used(txn, reset_token_id)
                    .await
                    .map_err(db_err)?;

                Ok(Some(updated))
            })
        })
        .await;

    match outcome {
        Ok(value) => Ok(value),
        Err(TransactionError::Connection(e) | TransactionError::Transaction(e)) => {
            Err(e).context("Failed to change password")
        }
    }
}

fn db_err(err: anyhow::Error) -> sea_orm::DbErr {
    match err.downcast::<sea_orm::DbErr>() {
        Ok(db) => db,
        Err(other) => sea_orm::DbErr::Custom(other.to_string()),
    }
}

pub async fn update_password<C: ConnectionTrait>(
    db: &C,
    email: &str,
    password_hash: String,
) -> Result<Option<users::Model>> {
    let Some(user) = find_by_email(db, email).await? else {
        return Ok(None);
    };

    let mut active: users::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());

    let updated = active
        .update(db)
        .await
        .context("Failed to update user password")?;

    Ok(Some(updated))
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<users::Model>> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
        .context("Failed to query user by email")
}

pub async fn exists_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<bool> {
    let count = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .count(db)
        .await
        .context("Failed to count users by email")?;
    Ok(count > 0)
}

pub async fn insert_user<C: ConnectionTrait>(db: &C, new: NewUser) -> Result<users::Model> {
    let now = chrono::Utc::now().to_rfc3339();
    let active = users::ActiveModel {
        email: Set(new.email),
        password_hash: Set(new.password_hash),
        first_name: Set(new.first_name),
        last_name: Set(new.last_name),
        enabled: Set(new.enabled),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    active.insert(db).await.context("Failed to insert user")
}

/// Argon2id hash on the blocking pool; salting and hashing are CPU bound
/// and must not stall the async runtime.
pub async fn hash_password_blocking(password: String) -> Result<String> {
    task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))
    })
    .await
    .context("Password hashing task panicked")?
}
