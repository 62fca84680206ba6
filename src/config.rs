use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub timing: TimingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub root: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Privileged key for admin and internal routes. Server-side only; never sent to clients.
    #[serde(skip_serializing)]
    pub service_role_key: Option<String>,
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub erase_redirect_delay_ms: u64,
    pub detail_timeout_secs: u64,
    pub detail_max_attempts: u32,
    pub autosave_idle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite:data/gallery_hub.db?mode=rwc".to_string(),
                max_connections: 5,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            storage: StorageConfig {
                root: "data/storage".to_string(),
                public_base_url: "http://localhost:3000".to_string(),
            },
            auth: AuthConfig {
                service_role_key: None,
                session_ttl_secs: 7 * 24 * 60 * 60,
            },
            timing: TimingConfig {
                erase_redirect_delay_ms: 2000,
                detail_timeout_secs: 15,
                detail_max_attempts: 3,
                autosave_idle_ms: 2000,
            },
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let service_role_key = env::var("SERVICE_ROLE_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        if service_role_key.is_none() {
            tracing::warn!("SERVICE_ROLE_KEY not set; admin and internal deletion routes are disabled");
        }

        let config = Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
                max_connections: env_or("DB_MAX_CONNECTIONS", defaults.database.max_connections),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env_or("SERVER_PORT", defaults.server.port),
            },
            storage: StorageConfig {
                root: env::var("STORAGE_ROOT").unwrap_or(defaults.storage.root),
                public_base_url: env::var("PUBLIC_BASE_URL")
                    .unwrap_or(defaults.storage.public_base_url),
            },
            auth: AuthConfig {
                service_role_key,
                session_ttl_secs: env_or("SESSION_TTL_SECS", defaults.auth.session_ttl_secs),
            },
            timing: TimingConfig {
                erase_redirect_delay_ms: env_or(
                    "ERASE_REDIRECT_DELAY_MS",
                    defaults.timing.erase_redirect_delay_ms,
                ),
                detail_timeout_secs: env_or(
                    "DETAIL_TIMEOUT_SECS",
                    defaults.timing.detail_timeout_secs,
                ),
                detail_max_attempts: env_or(
                    "DETAIL_MAX_ATTEMPTS",
                    defaults.timing.detail_max_attempts,
                ),
                autosave_idle_ms: env_or("AUTOSAVE_IDLE_MS", defaults.timing.autosave_idle_ms),
            },
        };

        if config.timing.detail_max_attempts == 0 {
            anyhow::bail!("DETAIL_MAX_ATTEMPTS must be at least 1");
        }

        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.auth.session_ttl_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.timing.detail_timeout_secs)
    }

    pub fn autosave_idle(&self) -> Duration {
        Duration::from_millis(self.timing.autosave_idle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_detail_page_limits() {
        let config = Config::default();
        assert_eq!(config.detail_timeout(), Duration::from_secs(15));
        assert_eq!(config.timing.detail_max_attempts, 3);
        assert!(config.auth.service_role_key.is_none());
    }

    #[test]
    fn test_service_key_is_not_serialized() {
        let mut config = Config::default();
        config.auth.service_role_key = Some("super-secret".to_string());
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("super-secret"));
    }
}
