pub mod local;

use async_trait::async_trait;

use crate::{auth::TokenBundle, config::AuthConfig, db::entities::admin, error::AppError};

pub use local::LocalAuthProvider;

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges credentials for a session token.
    async fn login(&self, email: &str, password: &str) -> Result<TokenBundle, AppError>;

    /// Resolves a bearer token to the admin it was issued to.
    async fn authenticate(&self, token: &str) -> Result<admin::Model, AppError>;

    async fn seed_admin(&self, _cfg: &AuthConfig) -> anyhow::Result<()> {
        Ok(())
    }
}
