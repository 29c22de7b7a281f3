use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AccessKey, Account};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body of `/api/desktop-auth`. The desktop client reads `success` and
/// `message` directly, so this endpoint does not use the envelope.
#[derive(Debug, Serialize)]
pub struct DesktopAuthResponse {
    pub success: bool,
    pub message: String,
}

impl DesktopAuthResponse {
    pub fn granted() -> Self {
        Self {
            success: true,
            message: "Authentication successful".to_string(),
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Account as exposed over HTTP. The password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct AccountDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub hwid: Option<String>,
    pub ip_address: Option<String>,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            hwid: account.hwid,
            ip_address: account.ip_address,
            is_admin: account.is_admin,
            is_blocked: account.is_blocked,
            created_at: account.created_at,
            last_login: account.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountPageDto {
    pub users: Vec<AccountDto>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

pub type AccessKeyDto = AccessKey;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}
