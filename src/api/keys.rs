//! Key endpoints for the signed-in account.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentAccount;
use super::validation::validate_required;
use super::{AccessKeyDto, ApiError, ApiResponse, AppState, MessageResponse};

#[derive(Debug, Deserialize)]
pub struct RedeemKeyRequest {
    pub key: String,
}

/// GET /api/keys
pub async fn list_keys(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Result<Json<ApiResponse<Vec<AccessKeyDto>>>, ApiError> {
    let keys = state.keys().list_for_account(account.id).await?;
    Ok(Json(ApiResponse::success(keys)))
}

/// POST /api/keys/redeem
pub async fn redeem_key(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<RedeemKeyRequest>,
) -> Result<Json<ApiResponse<AccessKeyDto>>, ApiError> {
    let key_value = validate_required(payload.key.trim(), "Key")?;
    let key = state.keys().claim(key_value, account.id).await?;
    Ok(Json(ApiResponse::success(key)))
}

/// DELETE /api/keys/{id}
/// Keys belonging to someone else are reported as not found.
pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Path(key_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.keys().delete_owned(key_id, account.id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Key deleted"))))
}
