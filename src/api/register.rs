//! Registration endpoints.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, validation};
use crate::models::User;
use crate::services::register_service::RegistrationRequest;

/// `POST /api/register`
///
/// Creates the user, its account, its role binding, and a confirmation
/// token in one shot. The user starts disabled and stays that way until
/// the confirmation link is followed.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    validation::validate_registration(&request)?;

    let user = state.register_service.register(request).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmResult {
    pub activated: bool,
}

/// `GET /api/register/confirm?token=...`
///
/// Activates the account behind the token. A stale or unknown token is
/// not an error; the caller just learns the activation did not happen.
pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConfirmParams>,
) -> Result<Json<ApiResponse<ConfirmResult>>, ApiError> {
    let token = validation::validate_token(&params.token)?;

    let activated = state.register_service.activate(token).await?;
    Ok(Json(ApiResponse::success(ConfirmResult { activated })))
}
