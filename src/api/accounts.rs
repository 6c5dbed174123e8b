//! Account endpoints: CRUD, membership, and the document set.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::{AddMemberRequest, CreateAccountRequest, UpdateAccountRequest, UploadDocumentRequest};
use super::{ApiError, ApiResponse, AppState, validation};
use crate::models::Account;
use crate::services::account_service::{AccountUpdateInput, NewAccountInput, NewDocumentInput};

/// `POST /api/accounts`
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let name = validation::validate_account_name(&request.name)?;

    let account = state
        .account_service
        .create(NewAccountInput {
            name: name.to_string(),
            owner_id: request.owner_id,
            service_level: request.service_level,
        })
        .await?;
    Ok(Json(ApiResponse::success(account)))
}

/// `GET /api/accounts/{id}`
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let account = state.account_service.get(id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// `PUT /api/accounts/{id}`
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let name = match &request.name {
        Some(name) => Some(validation::validate_account_name(name)?.to_string()),
        None => None,
    };

    let account = state
        .account_service
        .update(
            id,
            AccountUpdateInput {
                name,
                service_level: request.service_level,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(account)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub member_id: Option<i64>,
}

/// `GET /api/accounts?name=|ownerId=|memberId=`
///
/// Exactly one filter must be given.
pub async fn find_accounts(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<AccountFilter>,
) -> Result<Json<ApiResponse<Vec<Account>>>, ApiError> {
    let accounts = match (filter.name, filter.owner_id, filter.member_id) {
        (Some(name), None, None) => {
            vec![state.account_service.get_by_name(&name).await?]
        }
        (None, Some(owner_id), None) => state.account_service.list_by_owner(owner_id).await?,
        (None, None, Some(member_id)) => state.account_service.list_for_member(member_id).await?,
        _ => {
            return Err(ApiError::validation(
                "Provide exactly one of name, ownerId, or memberId",
            ));
        }
    };

    Ok(Json(ApiResponse::success(accounts)))
}

/// `POST /api/accounts/{id}/members`
pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<AddMemberRequest>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let email = validation::validate_email(&request.email)?;
    let account = state.account_service.add_member(id, email).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// `POST /api/accounts/{id}/documents`
///
/// Attaches a document. Duplicate names within the account are rejected,
/// and every member gets an email about the addition.
pub async fn add_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let name = validation::validate_document_name(&request.name)?;

    let account = state
        .account_service
        .add_document(
            id,
            NewDocumentInput {
                name: name.to_string(),
                extension: request.extension,
                content: request.content,
            },
        )
        .await?;
    Ok(Json(ApiResponse::success(account)))
}

/// `DELETE /api/accounts/{id}/documents/{name}`
pub async fn remove_document(
    State(state): State<Arc<AppState>>,
    Path((id, name)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let name = validation::validate_document_name(&name)?;
    let account = state.account_service.remove_document(id, name).await?;
    Ok(Json(ApiResponse::success(account)))
}
