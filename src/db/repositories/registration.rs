use sea_orm::{DatabaseConnection, TransactionError, TransactionTrait};
use thiserror::Error;

use crate::db::repositories::{account, auth_group, token, user};
use crate::entities::{confirmation_tokens, users};
use crate::models::{Role, ServiceLevel};

/// Everything a registration writes: the user row, its role binding, the
/// owning account, the owner's membership, and the confirmation token.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: user::NewUser,
    pub role: Role,
    pub account_name: String,
    pub service_level: ServiceLevel,
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("A user with email \"{0}\" already exists")]
    DuplicateEmail(String),
    #[error("An account named \"{0}\" already exists")]
    DuplicateAccountName(String),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

/// Runs the whole registration in one transaction so a failure at any step
/// leaves no partial rows behind. Returns the new user together with the
/// confirmation token issued for it.
pub async fn register(
    conn: &DatabaseConnection,
    registration: Registration,
) -> Result<(users::Model, confirmation_tokens::Model), RegistrationError> {
    let outcome = conn
        .transaction::<_, (users::Model, confirmation_tokens::Model), RegistrationError>(|txn| {
            Box::pin(async move {
                if user::exists_by_email(txn, &registration.user.email)
                    .await
                    .map_err(db_err)?
                {
                    return Err(RegistrationError::DuplicateEmail(registration.user.email));
                }
                if account::exists_by_name(txn, &registration.account_name)
                    .await
                    .map_err(db_err)?
                {
                    return Err(RegistrationError::DuplicateAccountName(
                        registration.account_name,
                    ));
                }

                let email = registration.user.email.clone();
                let user_row = user::insert_user(txn, registration.user)
                    .await
                    .map_err(db_err)?;

                auth_group::insert_auth_group(txn, &email, registration.role)
                    .await
                    .map_err(db_err)?;

                let account_row = account::insert_account(
                    txn,
                    &account::NewAccount {
                        name: registration.account_name,
                        owner_id: user_row.id,
                        service_level: registration.service_level,
                    },
                )
                .await
                .map_err(db_err)?;

                account::add_member(txn, account_row.id, user_row.id)
                    .await
                    .map_err(db_err)?;

                let token_row = token::create_confirmation(txn, user_row.id)
                    .await
                    .map_err(db_err)?;

                Ok((user_row, token_row))
            })
        })
        .await;

    match outcome {
        Ok(value) => Ok(value),
        Err(TransactionError::Connection(e)) => Err(RegistrationError::Db(e)),
        Err(TransactionError::Transaction(e)) => Err(e),
    }
}

fn db_err(err: anyhow::Error) -> RegistrationError {
    match err.downcast::<sea_orm::DbErr>() {
        Ok(db) => RegistrationError::Db(db),
        Err(other) => RegistrationError::Db(sea_orm::DbErr::Custom(other.to_string())),
    }
}
