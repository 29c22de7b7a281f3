use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::accounts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Opaque argon2 PHC string; never serialized
    pub password_hash: String,
    pub hwid: Option<String>,
    pub ip_address: Option<String>,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            password_hash: model.password_hash,
            hwid: model.hwid,
            ip_address: model.ip_address,
            is_admin: model.is_admin,
            is_blocked: model.is_blocked,
            created_at: model.created_at,
            last_login: model.last_login,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Partial update for an account. `None` leaves a column untouched;
/// the nested options on `hwid`/`ip_address` allow clearing.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub hwid: Option<Option<String>>,
    pub ip_address: Option<Option<String>>,
    pub is_blocked: Option<bool>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccountStats {
    pub total_users: u64,
    pub active_users: u64,
    pub blocked_users: u64,
    pub total_keys: u64,
}
