use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::entities::{confirmation_tokens, password_reset_tokens};

/// Both token kinds live for 24 hours from issue time. How that window is
/// evaluated differs per kind and is decided where the tokens are checked.
pub const TOKEN_TTL_HOURS: i64 = 24;

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_confirmation(
        &self,
        token: &str,
    ) -> Result<Option<confirmation_tokens::Model>> {
        confirmation_tokens::Entity::find()
            .filter(confirmation_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query confirmation token")
    }

    /// Confirmation tokens are single-shot: the row is removed once the
    /// account has been activated.
    pub async fn delete_confirmation(&self, id: i64) -> Result<()> {
        confirmation_tokens::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete confirmation token")?;
        Ok(())
    }

    /// Sweeps confirmation tokens whose expiry is behind `cutoff`. Returns
    /// how many rows went away.
    pub async fn delete_expired_confirmations(
        &self,
        cutoff: chrono::DateTime<Utc>,
    ) -> Result<u64> {
        let result = confirmation_tokens::Entity::delete_many()
            .filter(confirmation_tokens::Column::ExpiryDate.lt(cutoff))
            .exec(&self.conn)
            .await
            .context("Failed to sweep expired confirmation tokens")?;
        Ok(result.rows_affected)
    }

    pub async fn create_password_reset(
        &self,
        user_id: i64,
    ) -> Result<password_reset_tokens::Model> {
        let active = password_reset_tokens::ActiveModel {
            token: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id),
            expiry_date: Set(Utc::now() + Duration::hours(TOKEN_TTL_HOURS)),
            used: Set(false),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert password reset token")
    }

    pub async fn find_password_reset(
        &self,
        token: &str,
    ) -> Result<Option<password_reset_tokens::Model>> {
        password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query password reset token")
    }
}

/// Reset tokens are never deleted; they are flagged so replays can be told
/// apart from unknown tokens. Generic over the connection so the password
/// change can flag the token inside its transaction.
pub async fn mark_password_reset_used<C: ConnectionTrait>(db: &C, id: i64) -> Result<()> {
    let Some(row) = password_reset_tokens::Entity::find_by_id(id)
        .one(db)
        .await
        .context("Failed to query password reset token by ID")?
    else {
        anyhow::bail!("Password reset token {id} not found");
    };

    let mut active: password_reset_tokens::ActiveModel = row.into();
    active.used = Set(true);
    active
        .update(db)
        .await
        .context("Failed to mark password reset token used")?;
    Ok(())
}

/// Issues a confirmation token; generic over the connection so registration
/// can call it inside its transaction.
pub async fn create_confirmation<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
) -> Result<confirmation_tokens::Model> {
    let active = confirmation_tokens::ActiveModel {
        token: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id),
        expiry_date: Set(Utc::now() + Duration::hours(TOKEN_TTL_HOURS)),
        ..Default::default()
    };

    active
        .insert(db)
        .await
        .context("Failed to insert confirmation token")
}
