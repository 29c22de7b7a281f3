//! Domain service for accounts: registration, web sessions, profile and
//! administrator operations.

use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{Account, AccountStats};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is blocked")]
    Blocked,

    #[error("Account not found")]
    NotFound,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            StoreError::UniqueViolation(msg) if msg.contains("email") => Self::EmailTaken,
            StoreError::UniqueViolation(_) => Self::UsernameTaken,
            StoreError::Database(msg) => Self::Database(msg),
        }
    }
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountPage {
    pub accounts: Vec<Account>,
    pub total: u64,
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a regular (non-admin) account.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::UsernameTaken`] / [`AccountError::EmailTaken`] on conflicts.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError>;

    /// Verifies credentials and starts a web session, stamping `last_login`
    /// and `ip_address`.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] for unknown users and wrong
    /// passwords alike.
    async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: &str,
    ) -> Result<Account, AccountError>;

    async fn get(&self, id: Uuid) -> Result<Account, AccountError>;

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate)
    -> Result<Account, AccountError>;

    async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError>;

    /// Lists accounts newest first. `page` is 1-based.
    async fn list(&self, page: u64, limit: u64) -> Result<AccountPage, AccountError>;

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<Account, AccountError>;

    /// Clears the bound hardware id so the next desktop login binds a new one.
    async fn reset_hwid(&self, id: Uuid) -> Result<Account, AccountError>;

    async fn stats(&self) -> Result<AccountStats, AccountError>;

    async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError>;

    /// Creates the administrator only when no administrator exists yet.
    async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, AccountError>;
}
