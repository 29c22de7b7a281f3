//! Argon2id hashing and verification.
//!
//! Both operations are CPU-bound and run on `spawn_blocking` so they never
//! stall the async runtime.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::Arc;
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Clone)]
pub struct PasswordService {
    params: Params,
    /// Verified against when an account does not exist, so unknown usernames
    /// cost the same as wrong passwords.
    dummy_hash: Arc<str>,
}

impl PasswordService {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        let dummy_secret = random_secret();
        let dummy_hash = hash_with(&params, &dummy_secret)?;

        Ok(Self {
            params,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub async fn hash(&self, password: &str) -> Result<String> {
        let params = self.params.clone();
        let password = password.to_string();

        task::spawn_blocking(move || hash_with(&params, &password))
            .await
            .context("Password hashing task panicked")?
    }

    /// Verifies `password` against `hash`, or against the dummy hash when
    /// `hash` is `None` (always false in that case).
    pub async fn verify(&self, password: &str, hash: Option<&str>) -> Result<bool> {
        let matches_real_hash = hash.is_some();
        let hash = hash.map_or_else(|| self.dummy_hash.to_string(), str::to_string);
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            Ok::<bool, anyhow::Error>(
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid && matches_real_hash)
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn random_secret() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
pub(crate) fn cheap_security_config() -> SecurityConfig {
    SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        ..SecurityConfig::default()
    }
}
