use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub peers: PeerConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub url: String,
    #[serde(default = "default_view_ttl")]
    pub view_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { url: String::new(), view_ttl_secs: default_view_ttl() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    pub url: String,
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,
    /// `None` means retry forever; a bound turns give-up into a
    /// supervised restart.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_delay_secs: default_reconnect_delay(),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expire_minutes")]
    pub jwt_expire_minutes: i64,
    pub internal_api_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expire_minutes: default_jwt_expire_minutes(),
            internal_api_key: String::new(),
        }
    }
}

/// Private base URLs of the peer services, used by the cross-service clients.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PeerConfig {
    pub users_api_url: String,
    pub auth_api_url: String,
}

fn default_view_ttl() -> u64 { 60 * 60 * 24 }
fn default_reconnect_delay() -> u64 { 5 }
fn default_jwt_expire_minutes() -> i64 { 30 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.database.normalize_from_env();
        self.cache.normalize_from_env();
        self.broker.normalize_from_env();
        self.auth.normalize_from_env();
        self.peers.normalize_from_env();

        self.database.validate()?;
        self.broker.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    /// An empty URL is allowed: processes that never touch the store (the
    /// consumer worker) must not be forced to configure one.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Ok(());
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        Ok(())
    }
}

impl CacheConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("REDIS_URL") {
                self.url = url;
            }
        }
        if self.url.trim().is_empty() {
            self.url = "redis://127.0.0.1:6379".to_string();
        }
    }
}

impl BrokerConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("RABBIT_MQ_URL") {
                self.url = url;
            }
        }
        if self.reconnect_delay_secs == 0 {
            self.reconnect_delay_secs = default_reconnect_delay();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("broker.url is empty; provide it in config.toml or RABBIT_MQ_URL"));
        }
        if let Some(0) = self.max_attempts {
            return Err(anyhow!("broker.max_attempts must be >= 1 when set"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET_KEY") {
                self.jwt_secret = secret;
            }
        }
        if self.internal_api_key.trim().is_empty() {
            if let Ok(key) = std::env::var("INTERNAL_API_KEY") {
                self.internal_api_key = key;
            }
        }
        if let Ok(minutes) = std::env::var("JWT_EXPIRE_MINUTES") {
            if let Ok(minutes) = minutes.parse::<i64>() {
                self.jwt_expire_minutes = minutes;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; provide it in config.toml or JWT_SECRET_KEY"));
        }
        if self.internal_api_key.trim().is_empty() {
            return Err(anyhow!("auth.internal_api_key is empty; provide it in config.toml or INTERNAL_API_KEY"));
        }
        Ok(())
    }
}

impl PeerConfig {
    pub fn normalize_from_env(&mut self) {
        if self.users_api_url.trim().is_empty() {
            if let Ok(url) = std::env::var("USERS_API_PRIVATE_URL") {
                self.users_api_url = url;
            }
        }
        if self.auth_api_url.trim().is_empty() {
            if let Ok(url) = std::env::var("AUTH_API_PRIVATE_URL") {
                self.auth_api_url = url;
            }
        }
    }
}
