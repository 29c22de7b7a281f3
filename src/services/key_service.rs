//! Domain service for access key lifecycle: minting, claiming, revoking.

use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::AccessKey;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Access key not found")]
    NotFound,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Access key is already claimed")]
    AlreadyClaimed,

    #[error("Access key is inactive")]
    Inactive,

    #[error("Access key has expired")]
    Expired,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Could not mint a unique key value after {0} attempts")]
    Collision(u32),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for KeyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Database(other.to_string()),
        }
    }
}

/// Parameters for a generation batch.
#[derive(Debug, Clone)]
pub struct GenerateKeys {
    pub quantity: u32,

    /// `0` means the keys never expire.
    pub expiration_days: u32,

    pub prefix: Option<String>,

    pub notes: Option<String>,
}

#[async_trait::async_trait]
pub trait KeyService: Send + Sync {
    /// Mints `quantity` unowned, active keys.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Validation`] for a quantity outside the allowed range.
    async fn generate(&self, request: GenerateKeys) -> Result<Vec<AccessKey>, KeyError>;

    /// Redeems an unowned key by value for `account_id`.
    async fn claim(&self, key_value: &str, account_id: Uuid) -> Result<AccessKey, KeyError>;

    /// Assigns an unowned key by id to `account_id`.
    async fn assign(&self, key_id: Uuid, account_id: Uuid) -> Result<AccessKey, KeyError>;

    /// Revokes (`false`) or reactivates (`true`) a key.
    async fn set_active(&self, key_id: Uuid, active: bool) -> Result<AccessKey, KeyError>;

    /// Deletes any key. Unknown ids are reported as [`KeyError::NotFound`].
    async fn delete(&self, key_id: Uuid) -> Result<(), KeyError>;

    /// Deletes a key only if `account_id` owns it; otherwise [`KeyError::NotFound`].
    async fn delete_owned(&self, key_id: Uuid, account_id: Uuid) -> Result<(), KeyError>;

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<AccessKey>, KeyError>;

    async fn recent(&self, limit: u64) -> Result<Vec<AccessKey>, KeyError>;
}
