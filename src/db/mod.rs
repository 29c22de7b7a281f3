use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AccessKey, AccessKeyChanges, Account, AccountChanges, AccountStats, NewAccessKey, NewAccount,
};

pub mod credential_store;
pub mod migrator;
pub mod repositories;

pub use credential_store::{CredentialStore, StoreError};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn access_key_repo(&self) -> repositories::access_key::AccessKeyRepository {
        repositories::access_key::AccessKeyRepository::new(self.conn.clone())
    }

    fn login_attempt_repo(&self) -> repositories::login_attempt::LoginAttemptRepository {
        repositories::login_attempt::LoginAttemptRepository::new(self.conn.clone())
    }
}

#[async_trait]
impl CredentialStore for Store {
    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        self.account_repo().get_by_id(id).await
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.account_repo().get_by_username(username).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        self.account_repo().get_by_email(email).await
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        self.account_repo().create(new).await
    }

    async fn update_account(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Account, StoreError> {
        self.account_repo().update(id, changes).await
    }

    async fn bind_account_hwid(&self, id: Uuid, hwid: &str) -> Result<bool, StoreError> {
        self.account_repo().bind_hwid(id, hwid).await
    }

    async fn any_admin_exists(&self) -> Result<bool, StoreError> {
        self.account_repo().any_admin().await
    }

    async fn list_accounts(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Account>, u64), StoreError> {
        self.account_repo().list(limit, offset).await
    }

    async fn aggregate_stats(&self) -> Result<AccountStats, StoreError> {
        let (total_users, blocked_users) = self.account_repo().counts().await?;
        let total_keys = self.access_key_repo().count().await?;

        Ok(AccountStats {
            total_users,
            active_users: total_users.saturating_sub(blocked_users),
            blocked_users,
            total_keys,
        })
    }

    async fn find_access_key_by_id(&self, id: Uuid) -> Result<Option<AccessKey>, StoreError> {
        self.access_key_repo().get_by_id(id).await
    }

    async fn find_access_key_by_value(
        &self,
        value: &str,
    ) -> Result<Option<AccessKey>, StoreError> {
        self.access_key_repo().get_by_value(value).await
    }

    async fn create_access_key(&self, new: NewAccessKey) -> Result<AccessKey, StoreError> {
        self.access_key_repo().create(new).await
    }

    async fn update_access_key(
        &self,
        id: Uuid,
        changes: AccessKeyChanges,
    ) -> Result<(), StoreError> {
        self.access_key_repo().update(id, changes).await
    }

    async fn mark_access_key_used(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        only_if_unused: bool,
    ) -> Result<bool, StoreError> {
        self.access_key_repo()
            .mark_used(id, at, only_if_unused)
            .await
    }

    async fn assign_access_key(&self, id: Uuid, account_id: Uuid) -> Result<bool, StoreError> {
        self.access_key_repo().assign(id, account_id).await
    }

    async fn delete_access_key(&self, id: Uuid) -> Result<bool, StoreError> {
        self.access_key_repo().delete(id).await
    }

    async fn list_access_keys_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<AccessKey>, StoreError> {
        self.access_key_repo().list_for_account(account_id).await
    }

    async fn recent_access_keys(&self, limit: u64) -> Result<Vec<AccessKey>, StoreError> {
        self.access_key_repo().recent(limit).await
    }

    async fn record_login_attempt(
        &self,
        username: &str,
        address: &str,
        success: bool,
    ) -> Result<(), StoreError> {
        self.login_attempt_repo()
            .record(username, address, success)
            .await
    }

    async fn count_failed_attempts_since(
        &self,
        address: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.login_attempt_repo()
            .count_failures_since(address, since)
            .await
    }
}
