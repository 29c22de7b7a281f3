//! [`KeyService`] over any [`CredentialStore`].

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{CredentialStore, StoreError};
use crate::models::{AccessKey, AccessKeyChanges, NewAccessKey};
use crate::services::key_service::{GenerateKeys, KeyError, KeyService};

/// Fresh tokens tried per key before giving up on unique-constraint collisions.
const MAX_MINT_ATTEMPTS: u32 = 3;

pub struct DefaultKeyService {
    store: Arc<dyn CredentialStore>,
    default_prefix: String,
    max_batch_size: u32,
}

impl DefaultKeyService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, default_prefix: String, max_batch_size: u32) -> Self {
        Self {
            store,
            default_prefix,
            max_batch_size,
        }
    }

    async fn mint_one(&self, prefix: &str, template: &NewAccessKey) -> Result<AccessKey, KeyError> {
        for attempt in 1..=MAX_MINT_ATTEMPTS {
            let new_key = NewAccessKey {
                key_value: generate_key_value(prefix),
                ..template.clone()
            };

            match self.store.create_access_key(new_key).await {
                Ok(key) => return Ok(key),
                Err(StoreError::UniqueViolation(_)) => {
                    warn!(attempt, "Access key value collided, retrying with a fresh token");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(KeyError::Collision(MAX_MINT_ATTEMPTS))
    }

    async fn get(&self, key_id: Uuid) -> Result<AccessKey, KeyError> {
        self.store
            .find_access_key_by_id(key_id)
            .await?
            .ok_or(KeyError::NotFound)
    }
}

#[async_trait]
impl KeyService for DefaultKeyService {
    async fn generate(&self, request: GenerateKeys) -> Result<Vec<AccessKey>, KeyError> {
        if request.quantity == 0 || request.quantity > self.max_batch_size {
            return Err(KeyError::Validation(format!(
                "Quantity must be between 1 and {}",
                self.max_batch_size
            )));
        }

        let prefix = request
            .prefix
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.default_prefix.clone());

        let expires_at = if request.expiration_days > 0 {
            let expires_at = Duration::try_days(i64::from(request.expiration_days))
                .and_then(|days| Utc::now().checked_add_signed(days))
                .ok_or_else(|| {
                    KeyError::Validation(format!(
                        "Expiration of {} days is out of range",
                        request.expiration_days
                    ))
                })?;
            Some(expires_at)
        } else {
            None
        };

        let template = NewAccessKey {
            key_value: String::new(),
            expires_at,
            prefix: request.prefix.filter(|p| !p.is_empty()),
            notes: request.notes.filter(|n| !n.is_empty()),
        };

        let mut keys = Vec::with_capacity(request.quantity as usize);
        for _ in 0..request.quantity {
            keys.push(self.mint_one(&prefix, &template).await?);
        }

        metrics::counter!("access_keys_generated_total").increment(keys.len() as u64);
        info!(
            count = keys.len(),
            prefix = %prefix,
            expiration_days = request.expiration_days,
            "Generated access keys"
        );

        Ok(keys)
    }

    async fn claim(&self, key_value: &str, account_id: Uuid) -> Result<AccessKey, KeyError> {
        let key = self
            .store
            .find_access_key_by_value(key_value)
            .await?
            .ok_or(KeyError::NotFound)?;

        if !key.is_active {
            return Err(KeyError::Inactive);
        }
        if key.is_expired_at(Utc::now()) {
            return Err(KeyError::Expired);
        }
        if key.user_id.is_some() {
            return Err(KeyError::AlreadyClaimed);
        }

        if !self.store.assign_access_key(key.id, account_id).await? {
            return Err(KeyError::AlreadyClaimed);
        }

        info!(key_id = %key.id, account_id = %account_id, "Access key claimed");
        self.get(key.id).await
    }

    async fn assign(&self, key_id: Uuid, account_id: Uuid) -> Result<AccessKey, KeyError> {
        if self.store.find_account_by_id(account_id).await?.is_none() {
            return Err(KeyError::AccountNotFound);
        }

        let key = self.get(key_id).await?;
        if key.user_id.is_some() || !self.store.assign_access_key(key_id, account_id).await? {
            return Err(KeyError::AlreadyClaimed);
        }

        info!(key_id = %key_id, account_id = %account_id, "Access key assigned");
        self.get(key_id).await
    }

    async fn set_active(&self, key_id: Uuid, active: bool) -> Result<AccessKey, KeyError> {
        self.store
            .update_access_key(
                key_id,
                AccessKeyChanges {
                    is_active: Some(active),
                    ..Default::default()
                },
            )
            .await?;

        info!(key_id = %key_id, active, "Access key status changed");
        self.get(key_id).await
    }

    async fn delete(&self, key_id: Uuid) -> Result<(), KeyError> {
        if self.store.delete_access_key(key_id).await? {
            info!(key_id = %key_id, "Access key deleted");
            Ok(())
        } else {
            Err(KeyError::NotFound)
        }
    }

    async fn delete_owned(&self, key_id: Uuid, account_id: Uuid) -> Result<(), KeyError> {
        let key = self.get(key_id).await?;
        if !key.is_owned_by(account_id) {
            return Err(KeyError::NotFound);
        }
        self.delete(key_id).await
    }

    async fn list_for_account(&self, account_id: Uuid) -> Result<Vec<AccessKey>, KeyError> {
        Ok(self.store.list_access_keys_for_account(account_id).await?)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<AccessKey>, KeyError> {
        Ok(self.store.recent_access_keys(limit).await?)
    }
}

/// Builds `{prefix}-{16 hex}-{16 hex}` (uppercase) from the thread-local CSPRNG.
#[must_use]
pub fn generate_key_value(prefix: &str) -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let first: [u8; 8] = rng.random();
    let second: [u8; 8] = rng.random();

    format!("{prefix}-{}-{}", upper_hex(&first), upper_hex(&second))
}

fn upper_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            use std::fmt::Write;
            let _ = write!(acc, "{b:02X}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::{MemoryCredentialStore, account_fixture, key_fixture};
    use regex::Regex;

    fn service() -> (Arc<MemoryCredentialStore>, DefaultKeyService) {
        let store = Arc::new(MemoryCredentialStore::new());
        let service = DefaultKeyService::new(store.clone(), "PUI".to_string(), 100);
        (store, service)
    }

    fn request(quantity: u32, expiration_days: u32, prefix: Option<&str>) -> GenerateKeys {
        GenerateKeys {
            quantity,
            expiration_days,
            prefix: prefix.map(str::to_string),
            notes: None,
        }
    }

    #[test]
    fn test_key_value_format() {
        let pattern = Regex::new(r"^ABC-[0-9A-F]{16}-[0-9A-F]{16}$").unwrap();
        let value = generate_key_value("ABC");
        assert!(pattern.is_match(&value), "{value}");
        assert_ne!(generate_key_value("ABC"), value);
    }

    #[tokio::test]
    async fn test_generate_batch_with_prefix_and_expiry() {
        let (_, service) = service();
        let before = Utc::now();
        let keys = service
            .generate(request(5, 30, Some("BETA")))
            .await
            .unwrap();

        let pattern = Regex::new(r"^BETA-[0-9A-F]{16}-[0-9A-F]{16}$").unwrap();
        assert_eq!(keys.len(), 5);
        for key in &keys {
            assert!(pattern.is_match(&key.key_value), "{}", key.key_value);
            assert!(key.is_active);
            assert!(key.user_id.is_none());
            assert_eq!(key.prefix.as_deref(), Some("BETA"));

            let expires_at = key.expires_at.unwrap();
            assert!(expires_at >= before + Duration::days(30));
            assert!(expires_at <= Utc::now() + Duration::days(30));
        }
    }

    #[tokio::test]
    async fn test_zero_days_never_expires_and_default_prefix() {
        let (_, service) = service();
        let keys = service.generate(request(2, 0, None)).await.unwrap();

        assert!(keys.iter().all(|k| k.expires_at.is_none()));
        assert!(keys.iter().all(|k| k.key_value.starts_with("PUI-")));
        assert!(keys.iter().all(|k| k.prefix.is_none()));
    }

    #[tokio::test]
    async fn test_quantity_bounds() {
        let (_, service) = service();
        assert!(matches!(
            service.generate(request(0, 0, None)).await,
            Err(KeyError::Validation(_))
        ));
        assert!(matches!(
            service.generate(request(101, 0, None)).await,
            Err(KeyError::Validation(_))
        ));
        assert_eq!(service.generate(request(100, 0, None)).await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn test_unrepresentable_expiry_is_rejected() {
        let (store, service) = service();
        assert!(matches!(
            service.generate(request(1, 200_000_000, None)).await,
            Err(KeyError::Validation(_))
        ));
        assert_eq!(store.write_count(), 0);

        let keys = service.generate(request(1, 36_500, None)).await.unwrap();
        assert!(keys[0].expires_at.is_some());
    }

    #[tokio::test]
    async fn test_collision_is_retried() {
        let (store, service) = service();
        store.force_key_collisions(2);
        let keys = service.generate(request(1, 0, None)).await.unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_collision_fails_batch() {
        let (store, service) = service();
        store.force_key_collisions(MAX_MINT_ATTEMPTS);
        assert!(matches!(
            service.generate(request(3, 0, None)).await,
            Err(KeyError::Collision(_))
        ));
    }

    #[tokio::test]
    async fn test_claim_flow() {
        let (store, service) = service();
        let alice = account_fixture("alice", "x");
        let bob = account_fixture("bob", "x");
        let (alice_id, bob_id) = (alice.id, bob.id);
        store.insert_account(alice);
        store.insert_account(bob);

        let key = service.generate(request(1, 0, None)).await.unwrap().remove(0);

        let claimed = service.claim(&key.key_value, alice_id).await.unwrap();
        assert_eq!(claimed.user_id, Some(alice_id));

        assert!(matches!(
            service.claim(&key.key_value, bob_id).await,
            Err(KeyError::AlreadyClaimed)
        ));
        assert!(matches!(
            service.claim("PUI-DOES-NOT-EXIST", bob_id).await,
            Err(KeyError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_claim_rejects_revoked_key() {
        let (store, service) = service();
        let mut key = key_fixture("PUI-REVOKED", None);
        key.is_active = false;
        store.insert_key(key);

        assert!(matches!(
            service.claim("PUI-REVOKED", Uuid::new_v4()).await,
            Err(KeyError::Inactive)
        ));
    }

    #[tokio::test]
    async fn test_assign_requires_existing_account() {
        let (store, service) = service();
        let key = service.generate(request(1, 0, None)).await.unwrap().remove(0);

        assert!(matches!(
            service.assign(key.id, Uuid::new_v4()).await,
            Err(KeyError::AccountNotFound)
        ));

        let carol = account_fixture("carol", "x");
        let carol_id = carol.id;
        store.insert_account(carol);
        let assigned = service.assign(key.id, carol_id).await.unwrap();
        assert_eq!(assigned.user_id, Some(carol_id));
    }

    #[tokio::test]
    async fn test_revoke_and_reactivate() {
        let (_, service) = service();
        let key = service.generate(request(1, 0, None)).await.unwrap().remove(0);

        assert!(!service.set_active(key.id, false).await.unwrap().is_active);
        assert!(service.set_active(key.id, true).await.unwrap().is_active);
        assert!(matches!(
            service.set_active(Uuid::new_v4(), false).await,
            Err(KeyError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_missing_keys() {
        let (_, service) = service();
        let key = service.generate(request(1, 0, None)).await.unwrap().remove(0);

        service.delete(key.id).await.unwrap();
        assert!(matches!(service.delete(key.id).await, Err(KeyError::NotFound)));
        assert!(matches!(
            service.delete(Uuid::new_v4()).await,
            Err(KeyError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_owner_delete_hides_foreign_keys() {
        let (store, service) = service();
        let owner = Uuid::new_v4();
        let key = key_fixture("PUI-OWNED", Some(owner));
        let key_id = key.id;
        store.insert_key(key);

        assert!(matches!(
            service.delete_owned(key_id, Uuid::new_v4()).await,
            Err(KeyError::NotFound)
        ));
        service.delete_owned(key_id, owner).await.unwrap();
        assert!(store.key(key_id).is_none());
    }
}
