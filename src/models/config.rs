use crate::session::{MAX_TTL_SECS, SessionConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Minimum length accepted for the admin key
pub const MIN_ADMIN_KEY_LEN: usize = 16;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub session: SessionSettings,
    pub credentials: CredentialsConfig,
    pub admin: AdminConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body in bytes
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_bytes: 256 * 1024,
        }
    }
}

/// Session lifetime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Idle lifetime of a session in seconds (default: 1800 = 30 minutes)
    pub ttl_secs: i64,
    /// Background sweep interval in seconds, 0 disables it
    pub sweep_interval_secs: u64,
    /// Number of independently locked store shards
    pub shard_count: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            ttl_secs: defaults.ttl_secs,
            sweep_interval_secs: defaults.sweep_interval_secs,
            shard_count: defaults.shard_count,
        }
    }
}

impl SessionSettings {
    pub fn to_session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl_secs: self.ttl_secs,
            sweep_interval_secs: self.sweep_interval_secs,
            shard_count: self.shard_count,
        }
    }
}

/// Where identity -> secret pairs are read from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// JSON file mapping identity to secret
    pub path: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("users.json"),
        }
    }
}

/// Administrative access
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Key expected in the `X-Admin-Key` header; `None` disables the admin view
    pub key: Option<String>,
}

impl AppConfig {
    /// Socket address the server listens on
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                format!(
                    "Invalid listen address '{}:{}': {}",
                    self.server.host, self.server.port, e
                )
            })
    }

    /// Apply `PORT`, `ADMIN_KEY` and `USERS_PATH` overrides from `lookup`
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), String> {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| format!("Invalid PORT '{}': {}", port, e))?;
        }

        if let Some(key) = lookup("ADMIN_KEY")
            && !key.trim().is_empty()
        {
            self.admin.key = Some(key.trim().to_string());
        }

        if let Some(path) = lookup("USERS_PATH")
            && !path.trim().is_empty()
        {
            self.credentials.path = PathBuf::from(path.trim());
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.session.ttl_secs <= 0 {
            return Err("session.ttl_secs must be greater than zero".to_string());
        }

        if self.session.ttl_secs > MAX_TTL_SECS {
            return Err(format!(
                "session.ttl_secs must be at most {} (one year)",
                MAX_TTL_SECS
            ));
        }

        if self.session.shard_count == 0 {
            return Err("session.shard_count must be at least 1".to_string());
        }

        if self.credentials.path.as_os_str().is_empty() {
            return Err("credentials.path must not be empty".to_string());
        }

        if let Some(key) = &self.admin.key
            && key.len() < MIN_ADMIN_KEY_LEN
        {
            return Err(format!(
                "admin.key must be at least {} characters long",
                MIN_ADMIN_KEY_LEN
            ));
        }

        Ok(())
    }
}
