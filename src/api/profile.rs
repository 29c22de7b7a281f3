use axum::{Extension, Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::CurrentAccount;
use super::validation::{validate_email, validate_username};
use super::{ApiError, ApiResponse, AppState};
use crate::models::Account;
use crate::services::ProfileUpdate;

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub hwid: Option<String>,
    pub ip_address: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Account> for ProfileDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            hwid: account.hwid,
            ip_address: account.ip_address,
            last_login: account.last_login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// GET /api/profile
pub async fn get_profile(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Json<ApiResponse<ProfileDto>> {
    Json(ApiResponse::success(ProfileDto::from(account)))
}

/// PUT /api/profile
/// Absent fields are left unchanged.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<ProfileDto>>, ApiError> {
    let update = ProfileUpdate {
        username: payload
            .username
            .as_deref()
            .map(validate_username)
            .transpose()?
            .map(str::to_string),
        email: payload
            .email
            .as_deref()
            .map(validate_email)
            .transpose()?
            .map(str::to_string),
    };

    let updated = state.accounts().update_profile(account.id, update).await?;
    Ok(Json(ApiResponse::success(ProfileDto::from(updated))))
}
