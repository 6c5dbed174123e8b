//! User endpoints: lookup and the password reset flow.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::{ChangePasswordRequest, EnabledDto, PasswordResetRequest, TokenValidity};
use super::{ApiError, ApiResponse, AppState, validation};
use crate::models::User;

/// `GET /api/users/{email}`
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let email = validation::validate_email(&email)?;
    let user = state.user_service.get_by_email(email).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// `GET /api/users/{email}/enabled`
pub async fn get_user_enabled(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<EnabledDto>>, ApiError> {
    let email = validation::validate_email(&email)?;
    let enabled = state.user_service.is_enabled(email).await?;
    Ok(Json(ApiResponse::success(EnabledDto { enabled })))
}

/// `POST /api/users/resetPassword`
///
/// Issues a reset token and mails it. Unknown emails get a 404 so callers
/// can distinguish a typo from a lost email.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let email = validation::validate_email(&request.email)?;
    state.user_service.request_password_reset(email).await?;
    Ok(Json(ApiResponse::success(())))
}

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    pub token: String,
}

/// `GET /api/users/changePassword?token=...`
///
/// Tells a password reset form whether it is worth rendering.
pub async fn check_reset_token(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> Result<Json<ApiResponse<TokenValidity>>, ApiError> {
    let token = validation::validate_token(&params.token)?;
    let valid = state.user_service.is_valid_reset_token(token).await?;
    Ok(Json(ApiResponse::success(TokenValidity { valid })))
}

/// `POST /api/users/changePassword`
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let token = validation::validate_token(&request.token)?;
    let email = validation::validate_email(&request.email)?;
    validation::validate_password(&request.new_password)?;

    let user = state
        .user_service
        .change_password(token, email, &request.new_password)
        .await?;
    Ok(Json(ApiResponse::success(user)))
}
