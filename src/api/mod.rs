use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

mod accounts;
mod auth_groups;
mod documents;
mod error;
mod observability;
mod register;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{
    AccountService, DocumentService, RegisterService, SeaOrmAccountService, SeaOrmRegisterService,
    SeaOrmUserService, UserService,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub register_service: Arc<dyn RegisterService>,

    pub user_service: Arc<dyn UserService>,

    pub account_service: Arc<dyn AccountService>,

    pub document_service: Arc<DocumentService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn event_bus(&self) -> &crate::events::EventBus {
        &self.shared.event_bus
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let store = shared.store.clone();
    let event_bus = shared.event_bus.clone();

    let register_service: Arc<dyn RegisterService> = Arc::new(SeaOrmRegisterService::new(
        store.clone(),
        event_bus.clone(),
    ));
    let user_service: Arc<dyn UserService> =
        Arc::new(SeaOrmUserService::new(store.clone(), event_bus.clone()));
    let account_service: Arc<dyn AccountService> =
        Arc::new(SeaOrmAccountService::new(store.clone(), event_bus));
    let document_service = Arc::new(DocumentService::new(store));

    Arc::new(AppState {
        shared,
        register_service,
        user_service,
        account_service,
        document_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.shared.config.read().await;
        config.server.cors_allowed_origins.clone()
    };

    let api_router = Router::new()
        .route("/register", post(register::register))
        .route("/register/confirm", get(register::confirm))
        .route("/users/resetPassword", post(users::request_password_reset))
        .route("/users/changePassword", get(users::check_reset_token))
        .route("/users/changePassword", post(users::change_password))
        .route("/users/{email}", get(users::get_user))
        .route("/users/{email}/enabled", get(users::get_user_enabled))
        .route("/accounts", post(accounts::create_account))
        .route("/accounts", get(accounts::find_accounts))
        .route("/accounts/{id}", get(accounts::get_account))
        .route("/accounts/{id}", put(accounts::update_account))
        .route("/accounts/{id}/members", post(accounts::add_member))
        .route("/accounts/{id}/documents", post(accounts::add_document))
        .route(
            "/accounts/{id}/documents/{name}",
            delete(accounts::remove_document),
        )
        .route("/documents", post(documents::upload_document))
        .route("/documents", get(documents::find_document))
        .route("/documents/{id}", get(documents::get_document))
        .route("/documents/{id}", delete(documents::delete_document))
        .route("/authGroups", get(auth_groups::list_auth_groups))
        .route("/system/status", get(system::get_status))
        .route("/system/metrics", get(observability::get_metrics))
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .with_state(state);

    let cors_layer = if cors_origins.is_empty() || cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}
