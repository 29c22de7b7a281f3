//! Administrator endpoints: user management and key inventory.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::auth::CurrentAccount;
use super::validation::{
    DEFAULT_PAGE_LIMIT, DEFAULT_RECENT_KEYS, validate_key_prefix, validate_limit, validate_page,
    validate_quantity,
};
use super::{
    AccessKeyDto, AccountDto, AccountPageDto, ApiError, ApiResponse, AppState, LimitQuery,
    MessageResponse, PageQuery,
};
use crate::models::AccountStats;
use crate::services::GenerateKeys;

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    pub blocked: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateKeysRequest {
    pub quantity: u32,
    #[serde(default, alias = "expirationDays")]
    pub expiration_days: u32,
    pub prefix: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignKeyRequest {
    #[serde(alias = "userId")]
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

/// GET /api/admin/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<AccountStats>>, ApiError> {
    let stats = state.accounts().stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/admin/users?page&limit
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<AccountPageDto>>, ApiError> {
    let page = validate_page(query.page.unwrap_or(1))?;
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_PAGE_LIMIT))?;

    let result = state.accounts().list(page, limit).await?;

    Ok(Json(ApiResponse::success(AccountPageDto {
        users: result.accounts.into_iter().map(AccountDto::from).collect(),
        total: result.total,
        page,
        limit,
    })))
}

/// POST /api/admin/users/{id}/block
pub async fn set_blocked(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<BlockRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    if payload.blocked && account_id == admin.id {
        return Err(ApiError::validation(
            "Administrators cannot block their own account",
        ));
    }

    let account = state
        .accounts()
        .set_blocked(account_id, payload.blocked)
        .await?;

    info!(admin_id = %admin.id, account_id = %account.id, blocked = payload.blocked, "Admin changed account block status");
    Ok(Json(ApiResponse::success(AccountDto::from(account))))
}

/// DELETE /api/admin/users/{id}/hwid
pub async fn reset_hwid(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let account = state.accounts().reset_hwid(account_id).await?;

    info!(admin_id = %admin.id, account_id = %account.id, "Admin cleared hardware id");
    Ok(Json(ApiResponse::success(AccountDto::from(account))))
}

/// POST /api/admin/generate-keys
pub async fn generate_keys(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(admin)): Extension<CurrentAccount>,
    Json(payload): Json<GenerateKeysRequest>,
) -> Result<Json<ApiResponse<Vec<AccessKeyDto>>>, ApiError> {
    let max_batch = state.config().read().await.keys.max_batch_size;
    let quantity = validate_quantity(payload.quantity, max_batch)?;
    let prefix = validate_key_prefix(payload.prefix.as_deref())?.map(str::to_string);
    let notes = payload
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let keys = state
        .keys()
        .generate(GenerateKeys {
            quantity,
            expiration_days: payload.expiration_days,
            prefix,
            notes,
        })
        .await?;

    info!(admin_id = %admin.id, count = keys.len(), "Admin generated access keys");
    Ok(Json(ApiResponse::success(keys)))
}

/// GET /api/admin/recent-keys?limit
pub async fn recent_keys(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<AccessKeyDto>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_RECENT_KEYS))?;
    let keys = state.keys().recent(limit).await?;
    Ok(Json(ApiResponse::success(keys)))
}

/// POST /api/admin/keys/{id}/assign
pub async fn assign_key(
    State(state): State<Arc<AppState>>,
    Path(key_id): Path<Uuid>,
    Json(payload): Json<AssignKeyRequest>,
) -> Result<Json<ApiResponse<AccessKeyDto>>, ApiError> {
    let key = state.keys().assign(key_id, payload.user_id).await?;
    Ok(Json(ApiResponse::success(key)))
}

/// PUT /api/admin/keys/{id}/active
pub async fn set_key_active(
    State(state): State<Arc<AppState>>,
    Path(key_id): Path<Uuid>,
    Json(payload): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<AccessKeyDto>>, ApiError> {
    let key = state.keys().set_active(key_id, payload.active).await?;
    Ok(Json(ApiResponse::success(key)))
}

/// DELETE /api/admin/keys/{id}
pub async fn delete_key(
    State(state): State<Arc<AppState>>,
    Path(key_id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.keys().delete(key_id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new("Key deleted"))))
}
