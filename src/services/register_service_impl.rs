//! `SeaORM` implementation of the `RegisterService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use crate::db::repositories::user::hash_password_blocking;
use crate::db::{NewUser, Registration, Store};
use crate::events::{DomainEvent, EventBus};
use crate::models::{Role, User};
use crate::services::register_service::{RegisterError, RegisterService, RegistrationRequest};
use crate::services::tokens::{self, TokenStatus};

pub struct SeaOrmRegisterService {
    store: Store,
    event_bus: EventBus,
}

impl SeaOrmRegisterService {
    #[must_use]
    pub const fn new(store: Store, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }
}

#[async_trait]
impl RegisterService for SeaOrmRegisterService {
    async fn register(&self, request: RegistrationRequest) -> Result<User, RegisterError> {
        let password_hash = hash_password_blocking(request.user.password).await?;

        let registration = Registration {
            user: NewUser {
                email: request.user.email,
                password_hash,
                first_name: request.user.first_name,
                last_name: request.user.last_name,
                enabled: false,
            },
            role: request.role.unwrap_or(Role::User),
            account_name: request.account.name,
            service_level: request.account.service_level,
        };

        let (user, token) = self.store.register(registration).await?;

        metrics::counter!("registrations_total").increment(1);
        info!(user_id = user.id, email = %user.email, "User registered");

        let event = DomainEvent::RegistrationCompleted {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            token: token.token,
        };
        if self.event_bus.send(event).is_err() {
            warn!(user_id = user.id, "No event bus subscribers; confirmation email will not go out");
        }

        Ok(User::from(user))
    }

    async fn activate(&self, token: &str) -> Result<bool, RegisterError> {
        let Some(row) = self.store.find_confirmation_token(token).await? else {
            warn!(outcome = TokenStatus::NotFound.as_str(), "Account activation rejected");
            return Ok(false);
        };

        if tokens::confirmation_is_expired(&row, Utc::now()) {
            warn!(
                outcome = TokenStatus::Expired.as_str(),
                user_id = row.user_id,
                "Account activation rejected"
            );
            return Ok(false);
        }

        self.store.set_user_enabled(row.user_id, true).await?;
        self.store.delete_confirmation_token(row.id).await?;

        metrics::counter!("activations_total").increment(1);
        info!(user_id = row.user_id, "Account activated");

        Ok(true)
    }
}
