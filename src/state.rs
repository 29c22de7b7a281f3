use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{CredentialStore, Store};
use crate::services::{
    AccountService, DefaultAccountService, DefaultDesktopAuthService, DefaultKeyService,
    DesktopAuthService, KeyService, LoginThrottle, PasswordService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub account_service: Arc<dyn AccountService>,

    pub key_service: Arc<dyn KeyService>,

    pub desktop_auth: Arc<dyn DesktopAuthService>,

    pub throttle: LoginThrottle,
}

impl SharedState {
    /// Connects, migrates and wires services, then creates the bootstrap
    /// administrator when none exists.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let state = Self::connect(config).await?;
        state.bootstrap_admin().await;
        Ok(state)
    }

    /// Like [`SharedState::new`] without the bootstrap step.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let passwords = PasswordService::new(&config.security)?;
        let credentials: Arc<dyn CredentialStore> = Arc::new(store.clone());

        let account_service = Arc::new(DefaultAccountService::new(
            credentials.clone(),
            passwords.clone(),
        )) as Arc<dyn AccountService>;

        let key_service = Arc::new(DefaultKeyService::new(
            credentials.clone(),
            config.keys.default_prefix.clone(),
            config.keys.max_batch_size,
        )) as Arc<dyn KeyService>;

        let desktop_auth = Arc::new(DefaultDesktopAuthService::new(
            credentials.clone(),
            passwords,
            config.keys.single_use,
        )) as Arc<dyn DesktopAuthService>;

        let throttle = LoginThrottle::new(credentials, config.security.auth_throttle.clone());

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            account_service,
            key_service,
            desktop_auth,
            throttle,
        })
    }

    pub async fn bootstrap_admin(&self) {
        let bootstrap = self.config.read().await.bootstrap.clone();
        if !bootstrap.enabled {
            return;
        }

        match self
            .account_service
            .ensure_admin(
                &bootstrap.admin_username,
                &bootstrap.admin_email,
                &bootstrap.admin_password,
            )
            .await
        {
            Ok(Some(admin)) => {
                info!(username = %admin.username, "Bootstrap administrator created");
            }
            Ok(None) => {}
            Err(e) => warn!("Could not create bootstrap administrator: {e}"),
        }
    }
}
