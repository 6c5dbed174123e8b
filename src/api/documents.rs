//! Standalone document endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::UploadDocumentRequest;
use super::{ApiError, ApiResponse, AppState, validation};
use crate::models::Document;

/// `POST /api/documents`
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    let name = validation::validate_document_name(&request.name)?;

    let document = state
        .document_service
        .upload(name.to_string(), request.extension, request.content)
        .await?;
    Ok(Json(ApiResponse::success(document)))
}

/// `GET /api/documents/{id}`
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    let document = state.document_service.get(id).await?;
    Ok(Json(ApiResponse::success(document)))
}

#[derive(Debug, Deserialize)]
pub struct DocumentFilter {
    pub name: String,
}

/// `GET /api/documents?name=...`
pub async fn find_document(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<DocumentFilter>,
) -> Result<Json<ApiResponse<Document>>, ApiError> {
    let name = validation::validate_document_name(&filter.name)?;
    let document = state.document_service.get_by_name(name).await?;
    Ok(Json(ApiResponse::success(document)))
}

/// `DELETE /api/documents/{id}`
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.document_service.delete(id).await?;
    Ok(Json(ApiResponse::success(())))
}
