use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub keys: KeysConfig,

    pub bootstrap: BootstrapConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Login and desktop-auth throttling policy.
    pub auth_throttle: AuthThrottleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthThrottleConfig {
    pub enabled: bool,

    /// Max failed attempts per address in the window before lockout.
    pub max_attempts: u32,

    /// Rolling window for counting failures.
    pub window_seconds: u64,

    /// Trusted proxy IP addresses allowed to provide `X-Forwarded-For`.
    ///
    /// When empty, forwarded headers are ignored and the socket peer
    /// address is used.
    pub trusted_proxy_ips: Vec<String>,
}

impl Default for AuthThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 10,
            window_seconds: 5 * 60,
            trusted_proxy_ips: Vec::new(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            auth_throttle: AuthThrottleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Prefix used when an administrator does not supply one.
    pub default_prefix: String,

    /// Upper bound for a single generation batch.
    pub max_batch_size: u32,

    /// When set, a key authenticates a desktop session only once.
    /// Otherwise `used_at` is refreshed on every successful authentication.
    pub single_use: bool,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            default_prefix: "PUI".to_string(),
            max_batch_size: 100,
            single_use: false,
        }
    }
}

/// Administrator account created on startup when the database has none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub enabled: bool,

    pub admin_username: String,

    pub admin_email: String,

    pub admin_password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "change-me-please".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "keyhub".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Session expiry after this many minutes of inactivity.
    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
            secure_cookies: true,
            session_inactivity_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/keyhub.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("KEYHUB_DATABASE_URL")
            && !url.is_empty()
        {
            self.general.database_path = url;
        }

        if let Ok(password) = std::env::var("KEYHUB_ADMIN_PASSWORD")
            && !password.is_empty()
        {
            self.bootstrap.admin_password = password;
        }
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the defaults to `./config.toml` unless it exists.
    /// Returns whether a file was written.
    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            return Ok(false);
        }

        Self::default().save_to_path(&path)?;
        Ok(true)
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("keyhub").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".keyhub").join("config.toml"));
        }

        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.keys.default_prefix.is_empty() {
            anyhow::bail!("keys.default_prefix cannot be empty");
        }

        if self.keys.max_batch_size == 0 || self.keys.max_batch_size > 100 {
            anyhow::bail!("keys.max_batch_size must be between 1 and 100");
        }

        if self.security.auth_throttle.enabled
            && (self.security.auth_throttle.max_attempts == 0
                || self.security.auth_throttle.window_seconds == 0)
        {
            anyhow::bail!("auth_throttle.max_attempts and window_seconds must be > 0 when enabled");
        }

        if self.bootstrap.enabled && self.bootstrap.admin_password.len() < 8 {
            anyhow::bail!("bootstrap.admin_password must be at least 8 characters");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("general.min_db_connections cannot exceed max_db_connections");
        }

        Ok(())
    }
}
