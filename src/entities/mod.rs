pub mod prelude;

pub mod account_users;
pub mod accounts;
pub mod auth_groups;
pub mod confirmation_tokens;
pub mod documents;
pub mod password_reset_tokens;
pub mod users;
