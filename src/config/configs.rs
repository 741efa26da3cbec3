use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: Option<DatabaseConfig>,
    pub auth: Option<AuthConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_db_min_idle")]
    pub min_idle: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_access_token_ttl_minutes")]
    pub access_token_ttl_minutes: u64,
    /// Bootstrap super-admin, created on startup when missing.
    pub admin_email: String,
    pub admin_password: String,
}

fn default_db_max_connections() -> u32 {
    defaults::DEFAULT_DB_MAX_CONNECTIONS as u32
}

fn default_db_min_idle() -> u32 {
    defaults::DEFAULT_DB_MIN_IDLE as u32
}

fn default_access_token_ttl_minutes() -> u64 {
    defaults::DEFAULT_ACCESS_TOKEN_TTL_MINUTES as u64
}

#[cfg(test)]
mod tests {
    use ::config as config_rs;

    use super::*;

    #[test]
    fn nested_keys_deserialize_with_defaults() {
        let builder = config_rs::Config::builder()
            .set_override("auth.jwt_secret", "0123456789abcdef-secret")
            .expect("override should apply")
            .set_override("auth.admin_email", "root@example.com")
            .expect("override should apply")
            .set_override("auth.admin_password", "rootpassword")
            .expect("override should apply");

        let cfg = AppConfig::from_builder(builder).expect("config should load");

        assert_eq!(cfg.general.host, defaults::DEFAULT_HOST);
        assert_eq!(cfg.general.port, 3000);
        assert!(cfg.database.is_none());
        let auth = cfg.auth.expect("auth section should be present");
        assert_eq!(auth.access_token_ttl_minutes, 30);
        assert_eq!(auth.admin_email, "root@example.com");
    }

    #[test]
    fn invalid_sections_fail_validation() {
        let builder = config_rs::Config::builder()
            .set_override("auth.jwt_secret", "short")
            .expect("override should apply")
            .set_override("auth.admin_email", "root@example.com")
            .expect("override should apply")
            .set_override("auth.admin_password", "rootpassword")
            .expect("override should apply");

        let err = AppConfig::from_builder(builder).expect_err("config should be rejected");

        assert!(err.to_string().contains("auth.jwt_secret"));
    }
}
