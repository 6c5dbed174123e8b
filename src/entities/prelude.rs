pub use super::account_users::Entity as AccountUsers;
pub use super::accounts::Entity as Accounts;
pub use super::auth_groups::Entity as AuthGroups;
pub use super::confirmation_tokens::Entity as ConfirmationTokens;
pub use super::documents::Entity as Documents;
pub use super::password_reset_tokens::Entity as PasswordResetTokens;
pub use super::users::Entity as Users;
