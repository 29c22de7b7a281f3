//! Per-address lockout for credential endpoints, backed by the
//! `login_attempts` table.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::config::AuthThrottleConfig;
use crate::db::{CredentialStore, StoreError};

#[derive(Clone)]
pub struct LoginThrottle {
    store: Arc<dyn CredentialStore>,
    config: AuthThrottleConfig,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, config: AuthThrottleConfig) -> Self {
        Self { store, config }
    }

    /// True once `address` has `max_attempts` failures inside the window.
    pub async fn is_locked_out(&self, address: &str) -> Result<bool, StoreError> {
        if !self.config.enabled {
            return Ok(false);
        }

        let window = i64::try_from(self.config.window_seconds).unwrap_or(i64::MAX);
        let since = Utc::now() - Duration::seconds(window);
        let failures = self.store.count_failed_attempts_since(address, since).await?;

        let locked = failures >= u64::from(self.config.max_attempts);
        if locked {
            warn!(address, failures, "Credential endpoint locked out for address");
        }
        Ok(locked)
    }

    pub async fn record(
        &self,
        username: &str,
        address: &str,
        success: bool,
    ) -> Result<(), StoreError> {
        self.store
            .record_login_attempt(username, address, success)
            .await
    }

    #[must_use]
    pub fn trusted_proxies(&self) -> &[String] {
        &self.config.trusted_proxy_ips
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryCredentialStore;

    fn throttle(max_attempts: u32, enabled: bool) -> (Arc<MemoryCredentialStore>, LoginThrottle) {
        let store = Arc::new(MemoryCredentialStore::new());
        let config = AuthThrottleConfig {
            enabled,
            max_attempts,
            window_seconds: 300,
            trusted_proxy_ips: Vec::new(),
        };
        (store.clone(), LoginThrottle::new(store, config))
    }

    #[tokio::test]
    async fn test_locks_after_max_failures() {
        let (_, throttle) = throttle(3, true);

        for _ in 0..2 {
            throttle.record("alice", "10.0.0.1", false).await.unwrap();
        }
        assert!(!throttle.is_locked_out("10.0.0.1").await.unwrap());

        throttle.record("alice", "10.0.0.1", false).await.unwrap();
        assert!(throttle.is_locked_out("10.0.0.1").await.unwrap());
        assert!(!throttle.is_locked_out("10.0.0.2").await.unwrap());
    }

    #[tokio::test]
    async fn test_successes_do_not_count() {
        let (store, throttle) = throttle(1, true);
        throttle.record("alice", "10.0.0.1", true).await.unwrap();

        assert!(!throttle.is_locked_out("10.0.0.1").await.unwrap());
        assert_eq!(store.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_never_locks() {
        let (_, throttle) = throttle(1, false);
        throttle.record("alice", "10.0.0.1", false).await.unwrap();
        assert!(!throttle.is_locked_out("10.0.0.1").await.unwrap());
    }
}
