pub mod account_service;
pub use account_service::{
    AccountError, AccountService, AccountUpdateInput, NewAccountInput, NewDocumentInput,
};

pub mod account_service_impl;
pub use account_service_impl::SeaOrmAccountService;

pub mod document_service;
pub use document_service::{DocumentError, DocumentService};

pub mod register_service;
pub use register_service::{RegisterError, RegisterService, RegistrationRequest};

pub mod register_service_impl;
pub use register_service_impl::SeaOrmRegisterService;

pub mod user_service;
pub use user_service::{UserError, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;

pub mod maintenance;
pub mod notifier;
pub mod tokens;

pub use notifier::Notifier;
pub use tokens::TokenStatus;
