//! Domain service for desktop client authentication.
//!
//! A desktop session may start only when the account credentials, the
//! presented access key and the hardware fingerprint all line up.

use thiserror::Error;

use crate::db::StoreError;
use crate::models::Account;

/// Why a desktop authentication was refused. These are ordinary outcomes,
/// not faults; the `Display` text is what the client is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is blocked")]
    AccountBlocked,

    #[error("Invalid or inactive key")]
    InvalidOrInactiveKey,

    #[error("Key not associated with this user")]
    KeyNotAssociated,

    #[error("Key has expired")]
    KeyExpired,

    #[error("Hardware ID mismatch")]
    HardwareMismatch,

    #[error("Key has already been used")]
    KeyAlreadyUsed,
}

impl Rejection {
    /// Stable label for metrics and structured logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountBlocked => "account_blocked",
            Self::InvalidOrInactiveKey => "invalid_key",
            Self::KeyNotAssociated => "key_not_associated",
            Self::KeyExpired => "key_expired",
            Self::HardwareMismatch => "hwid_mismatch",
            Self::KeyAlreadyUsed => "key_already_used",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Granted(Account),
    Denied(Rejection),
}

impl AuthDecision {
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    #[must_use]
    pub const fn account(&self) -> Option<&Account> {
        match self {
            Self::Granted(account) => Some(account),
            Self::Denied(_) => None,
        }
    }

    #[must_use]
    pub const fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Granted(_) => None,
            Self::Denied(rejection) => Some(*rejection),
        }
    }
}

/// Store or hashing failure while evaluating a request.
#[derive(Debug, Error)]
pub enum DesktopAuthError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for DesktopAuthError {
    fn from(err: StoreError) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for DesktopAuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait DesktopAuthService: Send + Sync {
    /// Evaluates the guards in order and, when all pass, binds the hardware
    /// id (first time only) and stamps the key's `used_at`.
    ///
    /// Recording the login attempt is left to the caller.
    async fn validate(
        &self,
        username: &str,
        password: &str,
        key: &str,
        hwid: &str,
    ) -> Result<AuthDecision, DesktopAuthError>;
}
