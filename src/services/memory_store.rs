//! In-memory [`CredentialStore`] used by service unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

use crate::db::{CredentialStore, StoreError};
use crate::models::{
    AccessKey, AccessKeyChanges, Account, AccountChanges, AccountStats, NewAccessKey, NewAccount,
};

#[derive(Debug, Clone)]
pub struct RecordedAttempt {
    pub username: String,
    pub address: String,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    keys: Vec<AccessKey>,
    attempts: Vec<RecordedAttempt>,
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Inner>,
    /// Number of upcoming key inserts to reject as unique violations.
    forced_key_collisions: AtomicU32,
    /// Number of mutating calls seen, for asserting that rejections do not write.
    writes: AtomicU32,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, account: Account) {
        self.inner.lock().unwrap().accounts.push(account);
    }

    pub fn insert_key(&self, key: AccessKey) {
        self.inner.lock().unwrap().keys.push(key);
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        self.inner
            .lock()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    pub fn key(&self, id: Uuid) -> Option<AccessKey> {
        self.inner
            .lock()
            .unwrap()
            .keys
            .iter()
            .find(|k| k.id == id)
            .cloned()
    }

    pub fn attempts(&self) -> Vec<RecordedAttempt> {
        self.inner.lock().unwrap().attempts.clone()
    }

    pub fn force_key_collisions(&self, count: u32) {
        self.forced_key_collisions.store(count, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    fn note_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Builds an account with sensible defaults for tests.
pub fn account_fixture(username: &str, password_hash: &str) -> Account {
    Account {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: password_hash.to_string(),
        hwid: None,
        ip_address: None,
        is_admin: false,
        is_blocked: false,
        created_at: Utc::now(),
        last_login: None,
    }
}

/// Builds an active, non-expiring key owned by `owner`.
pub fn key_fixture(value: &str, owner: Option<Uuid>) -> AccessKey {
    AccessKey {
        id: Uuid::new_v4(),
        key_value: value.to_string(),
        user_id: owner,
        is_active: true,
        expires_at: None,
        created_at: Utc::now(),
        used_at: None,
        prefix: None,
        notes: None,
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.account(id))
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        self.note_write();
        let mut inner = self.inner.lock().unwrap();
        if inner
            .accounts
            .iter()
            .any(|a| a.username == new.username || a.email == new.email)
        {
            return Err(StoreError::UniqueViolation("accounts".to_string()));
        }

        let mut account = account_fixture(&new.username, &new.password_hash);
        account.email = new.email;
        account.is_admin = new.is_admin;
        inner.accounts.push(account.clone());
        Ok(account)
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Account, StoreError> {
        self.note_write();
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;

        if let Some(username) = changes.username {
            account.username = username;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            account.password_hash = password_hash;
        }
        if let Some(hwid) = changes.hwid {
            account.hwid = hwid;
        }
        if let Some(ip_address) = changes.ip_address {
            account.ip_address = ip_address;
        }
        if let Some(is_blocked) = changes.is_blocked {
            account.is_blocked = is_blocked;
        }
        if let Some(last_login) = changes.last_login {
            account.last_login = Some(last_login);
        }

        Ok(account.clone())
    }

    async fn bind_account_hwid(&self, id: Uuid, hwid: &str) -> Result<bool, StoreError> {
        self.note_write();
        let mut inner = self.inner.lock().unwrap();
        match inner.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) if account.hwid.is_none() => {
                account.hwid = Some(hwid.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn any_admin_exists(&self) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().accounts.iter().any(|a| a.is_admin))
    }

    async fn list_accounts(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Account>, u64), StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut accounts = inner.accounts.clone();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = accounts.len() as u64;
        let page = accounts
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    async fn aggregate_stats(&self) -> Result<AccountStats, StoreError> {
        let inner = self.inner.lock().unwrap();
        let total_users = inner.accounts.len() as u64;
        let blocked_users = inner.accounts.iter().filter(|a| a.is_blocked).count() as u64;
        Ok(AccountStats {
            total_users,
            active_users: total_users - blocked_users,
            blocked_users,
            total_keys: inner.keys.len() as u64,
        })
    }

    async fn find_access_key_by_id(&self, id: Uuid) -> Result<Option<AccessKey>, StoreError> {
        Ok(self.key(id))
    }

    async fn find_access_key_by_value(
        &self,
        value: &str,
    ) -> Result<Option<AccessKey>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.keys.iter().find(|k| k.key_value == value).cloned())
    }

    async fn create_access_key(&self, new: NewAccessKey) -> Result<AccessKey, StoreError> {
        self.note_write();
        let forced = self
            .forced_key_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if forced.is_ok() {
            return Err(StoreError::UniqueViolation(
                "access_keys.key_value".to_string(),
            ));
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.keys.iter().any(|k| k.key_value == new.key_value) {
            return Err(StoreError::UniqueViolation(
                "access_keys.key_value".to_string(),
            ));
        }

        let mut key = key_fixture(&new.key_value, None);
        key.expires_at = new.expires_at;
        key.prefix = new.prefix;
        key.notes = new.notes;
        inner.keys.push(key.clone());
        Ok(key)
    }

    async fn update_access_key(
        &self,
        id: Uuid,
        changes: AccessKeyChanges,
    ) -> Result<(), StoreError> {
        self.note_write();
        let mut inner = self.inner.lock().unwrap();
        let key = inner
            .keys
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("access key {id}")))?;

        if let Some(is_active) = changes.is_active {
            key.is_active = is_active;
        }
        if let Some(notes) = changes.notes {
            key.notes = notes;
        }
        Ok(())
    }

    async fn mark_access_key_used(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        only_if_unused: bool,
    ) -> Result<bool, StoreError> {
        self.note_write();
        let mut inner = self.inner.lock().unwrap();
        match inner.keys.iter_mut().find(|k| k.id == id) {
            Some(key) if !only_if_unused || key.used_at.is_none() => {
                key.used_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn assign_access_key(&self, id: Uuid, account_id: Uuid) -> Result<bool, StoreError> {
        self.note_write();
        let mut inner = self.inner.lock().unwrap();
        match inner.keys.iter_mut().find(|k| k.id == id) {
            Some(key) if key.user_id.is_none() => {
                key.user_id = Some(account_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_access_key(&self, id: Uuid) -> Result<bool, StoreError> {
        self.note_write();
        let mut inner = self.inner.lock().unwrap();
        let before = inner.keys.len();
        inner.keys.retain(|k| k.id != id);
        Ok(inner.keys.len() != before)
    }

    async fn list_access_keys_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<AccessKey>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut keys: Vec<AccessKey> = inner
            .keys
            .iter()
            .filter(|k| k.user_id == Some(account_id))
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn recent_access_keys(&self, limit: u64) -> Result<Vec<AccessKey>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut keys = inner.keys.clone();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        keys.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(keys)
    }

    async fn record_login_attempt(
        &self,
        username: &str,
        address: &str,
        success: bool,
    ) -> Result<(), StoreError> {
        self.inner.lock().unwrap().attempts.push(RecordedAttempt {
            username: username.to_string(),
            address: address.to_string(),
            success,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn count_failed_attempts_since(
        &self,
        address: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .attempts
            .iter()
            .filter(|a| a.address == address && !a.success && a.timestamp >= since)
            .count() as u64)
    }
}
