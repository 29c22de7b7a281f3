use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::access_keys;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessKey {
    pub id: Uuid,
    pub key_value: String,
    pub user_id: Option<Uuid>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub prefix: Option<String>,
    pub notes: Option<String>,
}

impl AccessKey {
    /// A key with no expiration never expires.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    #[must_use]
    pub fn is_owned_by(&self, account_id: Uuid) -> bool {
        self.user_id == Some(account_id)
    }
}

impl From<access_keys::Model> for AccessKey {
    fn from(model: access_keys::Model) -> Self {
        Self {
            id: model.id,
            key_value: model.key_value,
            user_id: model.user_id,
            is_active: model.is_active,
            expires_at: model.expires_at,
            created_at: model.created_at,
            used_at: model.used_at,
            prefix: model.prefix,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAccessKey {
    pub key_value: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub prefix: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccessKeyChanges {
    pub is_active: Option<bool>,
    pub notes: Option<Option<String>>,
}
