use async_trait::async_trait;

use crate::{
    auth::{TokenBundle, TokenIssuer},
    config::AuthConfig,
    db::entities::admin,
    error::{AppError, AuthError},
    services::admin_service::AdminService,
};

use super::AuthProvider;

#[derive(Clone)]
pub struct LocalAuthProvider {
    admin_service: AdminService,
    issuer: TokenIssuer,
}

impl LocalAuthProvider {
    pub fn new(admin_service: AdminService, issuer: TokenIssuer) -> Self {
        Self {
            admin_service,
            issuer,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn login(&self, email: &str, password: &str) -> Result<TokenBundle, AppError> {
        let Some(admin) = self
            .admin_service
            .verify_credentials(email, password)
            .await?
        else {
            tracing::debug!(email = %email.trim(), "login rejected");
            return Err(AuthError::InvalidCredentials.into());
        };

        let access_token = self.issuer.issue(&admin.email)?;
        tracing::info!(admin = %admin.email, "admin logged in");
        Ok(TokenBundle {
            access_token,
            token_type: "Bearer",
            expires_in: self.issuer.ttl_secs(),
        })
    }

    async fn authenticate(&self, token: &str) -> Result<admin::Model, AppError> {
        let email = self.issuer.validate(token).map_err(|cause| {
            tracing::debug!(%cause, "bearer token rejected");
            AuthError::InvalidCredentials
        })?;

        match self.admin_service.find_by_email(&email).await? {
            Some(admin) => Ok(admin),
            None => {
                tracing::debug!(%email, "token subject has no admin");
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    async fn seed_admin(&self, cfg: &AuthConfig) -> anyhow::Result<()> {
        self.admin_service
            .ensure_super_admin(&cfg.admin_email, &cfg.admin_password)
            .await
            .map_err(|err| anyhow::anyhow!("admin seed failed: {err}"))?;
        Ok(())
    }
}
