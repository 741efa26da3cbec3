use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{
        password::{hash_password, verify_password},
        require_privilege,
    },
    db::{
        dao::{AdminDao, DaoBase, DaoLayerError, PaginatedResponse},
        entities::admin,
    },
    error::{AppError, ConflictError, NotFoundError},
    services::{not_found_as, validation},
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewAdmin {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub super_admin: bool,
}

#[derive(Clone)]
pub struct AdminService {
    admin_dao: AdminDao,
}

impl AdminService {
    pub fn new(admin_dao: AdminDao) -> Self {
        Self { admin_dao }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<admin::Model>, AppError> {
        Ok(self.admin_dao.find_by_email(email).await?)
    }

    pub async fn find_admin(&self, id: Uuid) -> Result<admin::Model, AppError> {
        self.admin_dao
            .find_by_id(id)
            .await
            .map_err(not_found_as(NotFoundError::Admin))
    }

    /// Resolves credentials to an admin; `None` for unknown email or wrong password.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<admin::Model>, AppError> {
        let Some(admin) = self.find_by_email(email.trim()).await? else {
            return Ok(None);
        };
        Ok(verify_password(password, &admin.password_hash).then_some(admin))
    }

    pub async fn create_admin(
        &self,
        actor: &admin::Model,
        input: NewAdmin,
    ) -> Result<admin::Model, AppError> {
        require_privilege(actor)?;
        let admin = self.insert(input).await?;
        tracing::info!(actor = %actor.email, admin = %admin.email, "admin created");
        Ok(admin)
    }

    pub async fn list_admins(
        &self,
        actor: &admin::Model,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<admin::Model>, AppError> {
        require_privilege(actor)?;
        Ok(self.admin_dao.find(page, page_size, None, |query| query).await?)
    }

    pub async fn delete_admin(&self, actor: &admin::Model, id: Uuid) -> Result<(), AppError> {
        require_privilege(actor)?;
        if actor.id == id {
            return Err(AppError::validation("Admins cannot delete themselves"));
        }

        self.admin_dao
            .delete(id)
            .await
            .map_err(not_found_as(NotFoundError::Admin))?;
        tracing::info!(actor = %actor.email, admin_id = %id, "admin deleted");
        Ok(())
    }

    /// Creates the bootstrap super-admin unless an admin with that email exists.
    pub async fn ensure_super_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<admin::Model, AppError> {
        if let Some(existing) = self.find_by_email(email.trim()).await? {
            tracing::info!(admin = %existing.email, "bootstrap admin already present");
            return Ok(existing);
        }

        let admin = self
            .insert(NewAdmin {
                email: email.to_string(),
                password: password.to_string(),
                super_admin: true,
            })
            .await?;
        tracing::info!(admin = %admin.email, "seeded bootstrap admin");
        Ok(admin)
    }

    async fn insert(&self, input: NewAdmin) -> Result<admin::Model, AppError> {
        let email = validation::email(&input.email)?;
        let password = validation::password(&input.password)?;
        if self.admin_dao.find_by_email(&email).await?.is_some() {
            return Err(ConflictError::AdminEmail.into());
        }

        let password_hash = hash_password(password)?;
        match self
            .admin_dao
            .create_admin(&email, &password_hash, input.super_admin)
            .await
        {
            Ok(admin) => Ok(admin),
            Err(DaoLayerError::UniqueViolation(_)) => Err(ConflictError::AdminEmail.into()),
            Err(err) => Err(err.into()),
        }
    }
}
