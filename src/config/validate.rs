use anyhow::{Result, bail};

use super::{AppConfig, defaults::MIN_JWT_SECRET_LEN};

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if !auth.admin_email.contains('@') {
            errors.push("auth.admin_email must be an email address".to_string());
        }

        if auth.admin_password.len() < 8 {
            errors.push("auth.admin_password must be at least 8 characters".to_string());
        }

        if auth.jwt_secret.trim().len() < MIN_JWT_SECRET_LEN {
            errors.push(format!(
                "auth.jwt_secret must be at least {MIN_JWT_SECRET_LEN} characters"
            ));
        }

        if auth.access_token_ttl_minutes == 0 {
            errors.push("auth.access_token_ttl_minutes must be > 0".to_string());
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}

#[cfg(test)]
mod tests {
    use crate::config::{AppConfig, AuthConfig, DatabaseConfig};

    use super::validate;

    fn auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "a-long-enough-test-secret".to_string(),
            access_token_ttl_minutes: 30,
            admin_email: "root@example.com".to_string(),
            admin_password: "rootpassword".to_string(),
        }
    }

    #[test]
    fn accepts_defaults_with_auth_section() {
        let cfg = AppConfig {
            auth: Some(auth()),
            ..Default::default()
        };

        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn collects_every_problem() {
        let cfg = AppConfig {
            database: Some(DatabaseConfig {
                url: " ".to_string(),
                max_connections: 1,
                min_idle: 4,
            }),
            auth: Some(AuthConfig {
                access_token_ttl_minutes: 0,
                admin_password: "short".to_string(),
                ..auth()
            }),
            ..Default::default()
        };

        let message = validate(&cfg).expect_err("config should be invalid").to_string();

        assert!(message.contains("database.url"));
        assert!(message.contains("database.min_idle"));
        assert!(message.contains("auth.admin_password"));
        assert!(message.contains("auth.access_token_ttl_minutes"));
    }
}
