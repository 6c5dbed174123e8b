pub mod account;
pub mod document;
pub mod user;

pub use account::{Account, ServiceLevel};
pub use document::Document;
pub use user::{AuthGroup, Role, User};
