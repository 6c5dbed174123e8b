//! `SeaORM` implementation of the `AccountService` trait.

use std::future::Future;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::{AccountRepoError, AccountUpdate, NewAccount, NewDocument, Store};
use crate::events::{DomainEvent, EventBus};
use crate::models::Account;
use crate::services::account_service::{
    AccountError, AccountService, AccountUpdateInput, NewAccountInput, NewDocumentInput,
};

pub struct SeaOrmAccountService {
    store: Store,
    event_bus: EventBus,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    fn announce_document_change(&self, account: &Account, document_name: &str, added: bool) {
        let recipients: Vec<String> = account.users.iter().map(|u| u.email.clone()).collect();

        let event = if added {
            DomainEvent::DocumentAdded {
                account_name: account.name.clone(),
                document_name: document_name.to_string(),
                recipients,
            }
        } else {
            DomainEvent::DocumentRemoved {
                account_name: account.name.clone(),
                document_name: document_name.to_string(),
                recipients,
            }
        };

        if self.event_bus.send(event).is_err() {
            warn!(
                account = %account.name,
                document = %document_name,
                "No event bus subscribers; document notification will not go out"
            );
        }
    }
}

/// Runs `op` once more after a version conflict. A second conflict in a
/// row means real contention and is handed back to the caller.
async fn with_version_retry<T, F, Fut>(account_id: i64, mut op: F) -> Result<T, AccountRepoError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AccountRepoError>>,
{
    match op().await {
        Err(AccountRepoError::VersionConflict(_)) => {
            warn!(account_id, "Account mutation lost a version race, retrying once");
            metrics::counter!("account_version_conflicts_total").increment(1);
            op().await
        }
        other => other,
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn create(&self, input: NewAccountInput) -> Result<Account, AccountError> {
        if self
            .store
            .get_user_by_id(input.owner_id)
            .await?
            .is_none()
        {
            return Err(AccountError::NotFound(format!(
                "No user with ID {} to own the account",
                input.owner_id
            )));
        }

        if self.store.account_exists_by_name(&input.name).await? {
            return Err(AccountError::CouldNotBeSaved(format!(
                "An account named \"{}\" already exists",
                input.name
            )));
        }

        let account = self
            .store
            .insert_account(NewAccount {
                name: input.name,
                owner_id: input.owner_id,
                service_level: input.service_level,
            })
            .await?;

        self.store
            .add_account_member(account.id, account.owner_id)
            .await?;

        info!(account_id = account.id, name = %account.name, "Account created");

        Ok(self.store.load_account(account).await?)
    }

    async fn update(
        &self,
        account_id: i64,
        input: AccountUpdateInput,
    ) -> Result<Account, AccountError> {
        if let Some(name) = &input.name {
            let clash = self.store.get_account_by_name(name).await?;
            if clash.is_some_and(|other| other.id != account_id) {
                return Err(AccountError::CouldNotBeSaved(format!(
                    "An account named \"{name}\" already exists"
                )));
            }
        }

        let account = self
            .store
            .update_account(
                account_id,
                AccountUpdate {
                    name: input.name,
                    service_level: input.service_level,
                },
            )
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("No account with ID {account_id}")))?;

        Ok(self.store.load_account(account).await?)
    }

    async fn get(&self, account_id: i64) -> Result<Account, AccountError> {
        let account = self
            .store
            .get_account_by_id(account_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("No account with ID {account_id}")))?;
        Ok(self.store.load_account(account).await?)
    }

    async fn get_by_name(&self, name: &str) -> Result<Account, AccountError> {
        let account = self
            .store
            .get_account_by_name(name)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("No account named \"{name}\"")))?;
        Ok(self.store.load_account(account).await?)
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Account>, AccountError> {
        let rows = self.store.get_accounts_by_owner(owner_id).await?;
        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(self.store.load_account(row).await?);
        }
        Ok(accounts)
    }

    async fn list_for_member(&self, user_id: i64) -> Result<Vec<Account>, AccountError> {
        let rows = self.store.get_accounts_for_member(user_id).await?;
        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(self.store.load_account(row).await?);
        }
        Ok(accounts)
    }

    async fn add_member(&self, account_id: i64, email: &str) -> Result<Account, AccountError> {
        let account = self
            .store
            .get_account_by_id(account_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("No account with ID {account_id}")))?;

        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("No user with email {email}")))?;

        let already_member = self
            .store
            .account_members(account_id)
            .await?
            .iter()
            .any(|member| member.id == user.id);
        if already_member {
            return Err(AccountError::CouldNotBeSaved(format!(
                "User {email} is already a member of this account"
            )));
        }

        self.store.add_account_member(account_id, user.id).await?;
        info!(account_id, user_id = user.id, "Member added to account");

        Ok(self.store.load_account(account).await?)
    }

    async fn add_document(
        &self,
        account_id: i64,
        input: NewDocumentInput,
    ) -> Result<Account, AccountError> {
        let new = NewDocument {
            name: input.name.clone(),
            extension: input.extension,
            content: input.content,
            account_id: Some(account_id),
        };

        let account = with_version_retry(account_id, || {
            self.store.add_document_to_account(account_id, new.clone())
        })
        .await?;

        metrics::counter!("documents_added_total").increment(1);
        info!(account_id, document = %input.name, "Document added to account");

        self.announce_document_change(&account, &input.name, true);
        Ok(account)
    }

    async fn remove_document(
        &self,
        account_id: i64,
        name: &str,
    ) -> Result<Account, AccountError> {
        let account = with_version_retry(account_id, || {
            self.store.remove_document_from_account(account_id, name.to_string())
        })
        .await?;

        metrics::counter!("documents_removed_total").increment(1);
        info!(account_id, document = %name, "Document removed from account");

        self.announce_document_change(&account, name, false);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn version_retry_recovers_from_a_single_conflict() {
        let attempts = Cell::new(0);
        let result = with_version_retry(7, || {
            attempts.set(attempts.get() + 1);
            let attempt = attempts.get();
            async move {
                if attempt == 1 {
                    Err(AccountRepoError::VersionConflict(7))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn version_retry_gives_up_after_a_second_conflict() {
        let attempts = Cell::new(0);
        let result: Result<(), AccountRepoError> = with_version_retry(7, || {
            attempts.set(attempts.get() + 1);
            async { Err(AccountRepoError::VersionConflict(7)) }
        })
        .await;

        assert_eq!(attempts.get(), 2);
        assert!(matches!(result, Err(AccountRepoError::VersionConflict(7))));
    }

    #[tokio::test]
    async fn version_retry_passes_other_errors_through() {
        let attempts = Cell::new(0);
        let result: Result<(), AccountRepoError> = with_version_retry(7, || {
            attempts.set(attempts.get() + 1);
            async { Err(AccountRepoError::NotFound(7)) }
        })
        .await;

        assert_eq!(attempts.get(), 1);
        assert!(matches!(result, Err(AccountRepoError::NotFound(7))));
    }
}
