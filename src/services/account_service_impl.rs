//! [`AccountService`] over any [`CredentialStore`].

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::db::CredentialStore;
use crate::models::{Account, AccountChanges, AccountStats, NewAccount};
use crate::services::account_service::{AccountError, AccountPage, AccountService, ProfileUpdate};
use crate::services::password::PasswordService;

pub struct DefaultAccountService {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
}

impl DefaultAccountService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, passwords: PasswordService) -> Self {
        Self { store, passwords }
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<Account, AccountError> {
        if self.store.find_account_by_username(username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }
        if self.store.find_account_by_email(email).await?.is_some() {
            return Err(AccountError::EmailTaken);
        }

        let password_hash = self.passwords.hash(password).await?;

        let account = self
            .store
            .create_account(NewAccount {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                is_admin,
            })
            .await?;

        info!(account_id = %account.id, username = %account.username, is_admin, "Account created");
        Ok(account)
    }
}

#[async_trait]
impl AccountService for DefaultAccountService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        self.create(username, email, password, false).await
    }

    async fn login(
        &self,
        username: &str,
        password: &str,
        ip_address: &str,
    ) -> Result<Account, AccountError> {
        let account = self.store.find_account_by_username(username).await?;

        let is_valid = self
            .passwords
            .verify(password, account.as_ref().map(|a| a.password_hash.as_str()))
            .await?;

        let account = account
            .filter(|_| is_valid)
            .ok_or(AccountError::InvalidCredentials)?;

        if account.is_blocked {
            return Err(AccountError::Blocked);
        }

        let account = self
            .store
            .update_account(
                account.id,
                AccountChanges {
                    last_login: Some(Utc::now()),
                    ip_address: Some(Some(ip_address.to_string())),
                    ..Default::default()
                },
            )
            .await?;

        Ok(account)
    }

    async fn get(&self, id: Uuid) -> Result<Account, AccountError> {
        self.store
            .find_account_by_id(id)
            .await?
            .ok_or(AccountError::NotFound)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Account, AccountError> {
        let current = self.get(id).await?;

        let username = update.username.filter(|u| *u != current.username);
        let email = update.email.filter(|e| *e != current.email);

        if let Some(username) = &username
            && self.store.find_account_by_username(username).await?.is_some()
        {
            return Err(AccountError::UsernameTaken);
        }
        if let Some(email) = &email
            && self.store.find_account_by_email(email).await?.is_some()
        {
            return Err(AccountError::EmailTaken);
        }

        if username.is_none() && email.is_none() {
            return Ok(current);
        }

        let account = self
            .store
            .update_account(
                id,
                AccountChanges {
                    username,
                    email,
                    ..Default::default()
                },
            )
            .await?;

        Ok(account)
    }

    async fn change_password(
        &self,
        id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        if new_password.len() < 8 {
            return Err(AccountError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        if current_password == new_password {
            return Err(AccountError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let account = self.get(id).await?;
        let is_valid = self
            .passwords
            .verify(current_password, Some(&account.password_hash))
            .await?;

        if !is_valid {
            return Err(AccountError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = self.passwords.hash(new_password).await?;
        self.store
            .update_account(
                id,
                AccountChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        info!(account_id = %id, "Password changed");
        Ok(())
    }

    async fn list(&self, page: u64, limit: u64) -> Result<AccountPage, AccountError> {
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let (accounts, total) = self.store.list_accounts(limit, offset).await?;
        Ok(AccountPage { accounts, total })
    }

    async fn set_blocked(&self, id: Uuid, blocked: bool) -> Result<Account, AccountError> {
        let account = self
            .store
            .update_account(
                id,
                AccountChanges {
                    is_blocked: Some(blocked),
                    ..Default::default()
                },
            )
            .await?;

        info!(account_id = %id, blocked, "Account block status changed");
        Ok(account)
    }

    async fn reset_hwid(&self, id: Uuid) -> Result<Account, AccountError> {
        let account = self
            .store
            .update_account(
                id,
                AccountChanges {
                    hwid: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        info!(account_id = %id, "Hardware id cleared");
        Ok(account)
    }

    async fn stats(&self) -> Result<AccountStats, AccountError> {
        Ok(self.store.aggregate_stats().await?)
    }

    async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AccountError> {
        self.create(username, email, password, true).await
    }

    async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, AccountError> {
        if self.store.any_admin_exists().await? {
            return Ok(None);
        }

        let account = self.create_admin(username, email, password).await?;
        Ok(Some(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryCredentialStore;
    use crate::services::password::cheap_security_config;

    fn service() -> (Arc<MemoryCredentialStore>, DefaultAccountService) {
        let store = Arc::new(MemoryCredentialStore::new());
        let passwords = PasswordService::new(&cheap_security_config()).unwrap();
        (store.clone(), DefaultAccountService::new(store, passwords))
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (store, service) = service();
        let account = service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();
        assert!(!account.is_admin);
        assert_ne!(account.password_hash, "password123");

        let logged_in = service
            .login("alice", "password123", "10.0.0.7")
            .await
            .unwrap();
        assert!(logged_in.last_login.is_some());
        assert_eq!(
            store.account(account.id).unwrap().ip_address.as_deref(),
            Some("10.0.0.7")
        );
    }

    #[tokio::test]
    async fn test_register_conflicts() {
        let (_, service) = service();
        service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        assert!(matches!(
            service.register("alice", "other@example.com", "password123").await,
            Err(AccountError::UsernameTaken)
        ));
        assert!(matches!(
            service.register("bob", "alice@example.com", "password123").await,
            Err(AccountError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let (_, service) = service();
        service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        assert!(matches!(
            service.login("alice", "wrong-password", "ip").await,
            Err(AccountError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody", "password123", "ip").await,
            Err(AccountError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_blocked_account_cannot_login() {
        let (_, service) = service();
        let account = service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();
        service.set_blocked(account.id, true).await.unwrap();

        assert!(matches!(
            service.login("alice", "password123", "ip").await,
            Err(AccountError::Blocked)
        ));

        service.set_blocked(account.id, false).await.unwrap();
        assert!(service.login("alice", "password123", "ip").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password() {
        let (_, service) = service();
        let account = service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();

        assert!(matches!(
            service.change_password(account.id, "password123", "short").await,
            Err(AccountError::Validation(_))
        ));
        assert!(matches!(
            service
                .change_password(account.id, "wrong-current", "new-password-1")
                .await,
            Err(AccountError::Validation(_))
        ));

        service
            .change_password(account.id, "password123", "new-password-1")
            .await
            .unwrap();
        assert!(service.login("alice", "new-password-1", "ip").await.is_ok());
        assert!(service.login("alice", "password123", "ip").await.is_err());
    }

    #[tokio::test]
    async fn test_update_profile_enforces_uniqueness() {
        let (_, service) = service();
        let alice = service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();
        service
            .register("bob", "bob@example.com", "password123")
            .await
            .unwrap();

        let err = service
            .update_profile(
                alice.id,
                ProfileUpdate {
                    username: Some("bob".to_string()),
                    email: None,
                },
            )
            .await;
        assert!(matches!(err, Err(AccountError::UsernameTaken)));

        let updated = service
            .update_profile(
                alice.id,
                ProfileUpdate {
                    username: Some("alice2".to_string()),
                    email: Some("alice@example.com".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_reset_hwid_and_stats() {
        let (store, service) = service();
        let alice = service
            .register("alice", "alice@example.com", "password123")
            .await
            .unwrap();
        let bob = service
            .register("bob", "bob@example.com", "password123")
            .await
            .unwrap();
        store
            .update_account(
                alice.id,
                AccountChanges {
                    hwid: Some(Some("HW-1".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(service.reset_hwid(alice.id).await.unwrap().hwid.is_none());

        service.set_blocked(bob.id, true).await.unwrap();
        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_users, 1);
        assert_eq!(stats.blocked_users, 1);
        assert_eq!(stats.total_keys, 0);

        assert!(matches!(
            service.set_blocked(Uuid::new_v4(), true).await,
            Err(AccountError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_runs_once() {
        let (_, service) = service();
        let first = service
            .ensure_admin("admin", "admin@example.com", "admin-password")
            .await
            .unwrap();
        assert!(first.is_some_and(|a| a.is_admin));

        let second = service
            .ensure_admin("admin2", "admin2@example.com", "admin-password")
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let (_, service) = service();
        for i in 0..3 {
            service
                .register(&format!("user{i}"), &format!("user{i}@example.com"), "password123")
                .await
                .unwrap();
        }

        let page = service.list(1, 2).await.unwrap();
        assert_eq!(page.accounts.len(), 2);
        assert_eq!(page.total, 3);

        let page = service.list(2, 2).await.unwrap();
        assert_eq!(page.accounts.len(), 1);
    }
}
