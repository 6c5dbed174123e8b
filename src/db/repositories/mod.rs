pub mod account;
pub mod auth_group;
pub mod document;
pub mod registration;
pub mod token;
pub mod user;
