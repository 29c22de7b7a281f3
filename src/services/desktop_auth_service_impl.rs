//! [`DesktopAuthService`] over any [`CredentialStore`].

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::CredentialStore;
use crate::services::desktop_auth_service::{
    AuthDecision, DesktopAuthError, DesktopAuthService, Rejection,
};
use crate::services::password::PasswordService;

pub struct DefaultDesktopAuthService {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
    single_use_keys: bool,
}

impl DefaultDesktopAuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: PasswordService,
        single_use_keys: bool,
    ) -> Self {
        Self {
            store,
            passwords,
            single_use_keys,
        }
    }

    async fn evaluate(
        &self,
        username: &str,
        password: &str,
        key: &str,
        hwid: &str,
    ) -> Result<AuthDecision, DesktopAuthError> {
        let account = self.store.find_account_by_username(username).await?;

        // Verify even for unknown usernames so both paths take the same time
        let password_ok = self
            .passwords
            .verify(password, account.as_ref().map(|a| a.password_hash.as_str()))
            .await?;

        let Some(mut account) = account.filter(|_| password_ok) else {
            return Ok(AuthDecision::Denied(Rejection::InvalidCredentials));
        };

        if account.is_blocked {
            return Ok(AuthDecision::Denied(Rejection::AccountBlocked));
        }

        let Some(access_key) = self
            .store
            .find_access_key_by_value(key)
            .await?
            .filter(|k| k.is_active)
        else {
            return Ok(AuthDecision::Denied(Rejection::InvalidOrInactiveKey));
        };

        if !access_key.is_owned_by(account.id) {
            return Ok(AuthDecision::Denied(Rejection::KeyNotAssociated));
        }

        let now = Utc::now();
        if access_key.is_expired_at(now) {
            return Ok(AuthDecision::Denied(Rejection::KeyExpired));
        }

        if let Some(bound) = account.hwid.as_deref()
            && bound != hwid
        {
            return Ok(AuthDecision::Denied(Rejection::HardwareMismatch));
        }

        // Single-use keys are claimed before the fingerprint is bound, so a
        // lost race on the key leaves the account untouched.
        if self.single_use_keys
            && (access_key.used_at.is_some()
                || !self
                    .store
                    .mark_access_key_used(access_key.id, now, true)
                    .await?)
        {
            return Ok(AuthDecision::Denied(Rejection::KeyAlreadyUsed));
        }

        if account.hwid.is_none() {
            if !self.store.bind_account_hwid(account.id, hwid).await? {
                // Someone bound a fingerprint between our read and write
                let current = self
                    .store
                    .find_account_by_id(account.id)
                    .await?
                    .and_then(|a| a.hwid);
                if current.as_deref() != Some(hwid) {
                    return Ok(AuthDecision::Denied(Rejection::HardwareMismatch));
                }
            }
            debug!(account_id = %account.id, "Bound hardware id on first desktop login");
            account.hwid = Some(hwid.to_string());
        }

        if !self.single_use_keys {
            self.store
                .mark_access_key_used(access_key.id, now, false)
                .await?;
        }

        Ok(AuthDecision::Granted(account))
    }
}

#[async_trait]
impl DesktopAuthService for DefaultDesktopAuthService {
    async fn validate(
        &self,
        username: &str,
        password: &str,
        key: &str,
        hwid: &str,
    ) -> Result<AuthDecision, DesktopAuthError> {
        let decision = self.evaluate(username, password, key, hwid).await?;

        let outcome = decision.rejection().map_or("granted", Rejection::label);
        metrics::counter!("desktop_auth_total", "outcome" => outcome).increment(1);

        if let Some(rejection) = decision.rejection() {
            warn!(
                event = "desktop_auth_denied",
                username = %username,
                reason = rejection.label(),
                "Desktop authentication denied"
            );
        }

        Ok(decision)
    }
}
