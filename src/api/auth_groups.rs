//! Role binding lookup.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, validation};
use crate::models::AuthGroup;

#[derive(Debug, Deserialize)]
pub struct AuthGroupFilter {
    pub username: String,
}

/// `GET /api/authGroups?username=...`
///
/// Rows with a role string the current build does not know are skipped
/// rather than failing the whole lookup.
pub async fn list_auth_groups(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AuthGroupFilter>,
) -> Result<Json<ApiResponse<Vec<AuthGroup>>>, ApiError> {
    let username = validation::validate_email(&filter.username)?;

    let groups = state
        .store()
        .auth_groups_for_username(username)
        .await?
        .into_iter()
        .filter_map(AuthGroup::from_model)
        .collect();

    Ok(Json(ApiResponse::success(groups)))
}
