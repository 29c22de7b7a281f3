//! Boundary between the authorization core and persistence.
//!
//! Services take an `Arc<dyn CredentialStore>` so tests can swap the
//! sea-orm [`Store`](super::Store) for an in-memory fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    AccessKey, AccessKeyChanges, Account, AccountChanges, AccountStats, NewAccessKey, NewAccount,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => Self::UniqueViolation(msg),
            _ => Self::Database(err.to_string()),
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_username(&self, username: &str)
    -> Result<Option<Account>, StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] on a duplicate username or email.
    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError>;

    async fn update_account(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Account, StoreError>;

    /// Binds `hwid` only if the account has none. Returns whether this call bound it.
    async fn bind_account_hwid(&self, id: Uuid, hwid: &str) -> Result<bool, StoreError>;

    async fn any_admin_exists(&self) -> Result<bool, StoreError>;

    async fn list_accounts(&self, limit: u64, offset: u64)
    -> Result<(Vec<Account>, u64), StoreError>;

    async fn aggregate_stats(&self) -> Result<AccountStats, StoreError>;

    async fn find_access_key_by_id(&self, id: Uuid) -> Result<Option<AccessKey>, StoreError>;

    async fn find_access_key_by_value(&self, value: &str)
    -> Result<Option<AccessKey>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the key value is taken.
    async fn create_access_key(&self, new: NewAccessKey) -> Result<AccessKey, StoreError>;

    async fn update_access_key(
        &self,
        id: Uuid,
        changes: AccessKeyChanges,
    ) -> Result<(), StoreError>;

    /// Stamps `used_at`; with `only_if_unused` only a key whose `used_at` is
    /// still unset is updated. Returns whether a row changed.
    async fn mark_access_key_used(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        only_if_unused: bool,
    ) -> Result<bool, StoreError>;

    /// Assigns an unowned key. Returns `false` if the key already has an owner
    /// or does not exist.
    async fn assign_access_key(&self, id: Uuid, account_id: Uuid) -> Result<bool, StoreError>;

    /// Returns `false` when no key had that id.
    async fn delete_access_key(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn list_access_keys_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<AccessKey>, StoreError>;

    async fn recent_access_keys(&self, limit: u64) -> Result<Vec<AccessKey>, StoreError>;

    async fn record_login_attempt(
        &self,
        username: &str,
        address: &str,
        success: bool,
    ) -> Result<(), StoreError>;

    async fn count_failed_attempts_since(
        &self,
        address: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}
