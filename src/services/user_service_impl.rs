//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::db::Store;
use crate::db::repositories::user::hash_password_blocking;
use crate::events::{DomainEvent, EventBus};
use crate::models::User;
use crate::services::tokens::{self, TokenStatus};
use crate::services::user_service::{UserError, UserService};

pub struct SeaOrmUserService {
    store: Store,
    event_bus: EventBus,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn get_by_email(&self, email: &str) -> Result<User, UserError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("No user with email {email}")))?;
        Ok(User::from(user))
    }

    async fn get_by_id(&self, id: i64) -> Result<User, UserError> {
        let user = self
            .store
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("No user with ID {id}")))?;
        Ok(User::from(user))
    }

    async fn is_enabled(&self, email: &str) -> Result<bool, UserError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("No user with email {email}")))?;
        Ok(user.enabled)
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), UserError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("No user with email {email}")))?;

        let token = self.store.create_password_reset_token(user.id).await?;

        metrics::counter!("password_reset_requests_total").increment(1);
        info!(user_id = user.id, "Password reset requested");

        let event = DomainEvent::PasswordResetRequested {
            email: user.email,
            token: token.token,
        };
        if self.event_bus.send(event).is_err() {
            warn!(user_id = user.id, "No event bus subscribers; reset email will not go out");
        }

        Ok(())
    }

    async fn is_valid_reset_token(&self, token: &str) -> Result<bool, UserError> {
        let Some(row) = self.store.find_password_reset_token(token).await? else {
            return Ok(false);
        };
        // Presence and age only; a spent token still reports valid here
        // and is rejected by change_password instead.
        Ok(!tokens::reset_is_expired(&row, Utc::now()))
    }

    async fn change_password(
        &self,
        token: &str,
        email: &str,
        new_password: &str,
    ) -> Result<User, UserError> {
        let Some(row) = self.store.find_password_reset_token(token).await? else {
            warn!(outcome = TokenStatus::NotFound.as_str(), "Password change rejected");
            return Err(UserError::NotFound(
                "No password reset token matching the supplied value".to_string(),
            ));
        };

        let status = tokens::reset_token_status(&row, Utc::now());
        if status != TokenStatus::Valid {
            warn!(outcome = status.as_str(), user_id = row.user_id, "Password change rejected");
            return Err(UserError::InvalidToken(
                "Password reset token is no longer valid".to_string(),
            ));
        }

        let owner = self
            .store
            .get_user_by_id(row.user_id)
            .await?
            .ok_or_else(|| UserError::Internal("Reset token owner is gone".to_string()))?;

        // The token must belong to the user whose password is changing.
        if owner.email != email {
            warn!(user_id = row.user_id, "Password change rejected: token/email mismatch");
            return Err(UserError::InvalidToken(
                "Token does not belong to this user".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(new_password.to_string()).await?;
        let updated = self
            .store
            .change_user_password(email, password_hash, row.id)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("No user with email {email}")))?;

        metrics::counter!("password_changes_total").increment(1);
        info!(user_id = updated.id, "Password changed");

        Ok(User::from(updated))
    }
}
