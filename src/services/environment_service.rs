use sea_orm::{Order, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::{
        dao::{ColumnFilter, DaoBase, DaoLayerError, DeviceDao, EnvironmentDao, PaginatedResponse},
        entities::{admin, environment, user},
    },
    error::{AppError, ConflictError, NotFoundError},
    services::{SortOrder, access_service::AccessService, not_found_as, validation},
    text::{self, LIKE_ESCAPE},
};

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentInput {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentFilter {
    pub name: Option<String>,
    pub sort_order: Option<SortOrder>,
}

fn name_conflict(err: DaoLayerError) -> AppError {
    match err {
        DaoLayerError::UniqueViolation(_) => ConflictError::EnvironmentName.into(),
        DaoLayerError::NotFound { .. } => NotFoundError::Environment.into(),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct EnvironmentService {
    environment_dao: EnvironmentDao,
    device_dao: DeviceDao,
    access: AccessService,
}

impl EnvironmentService {
    pub fn new(environment_dao: EnvironmentDao, device_dao: DeviceDao, access: AccessService) -> Self {
        Self {
            environment_dao,
            device_dao,
            access,
        }
    }

    async fn ensure_name_free(&self, name: &str, own_id: Option<Uuid>) -> Result<(), AppError> {
        match self.environment_dao.find_by_name(name).await? {
            Some(existing) if Some(existing.id) != own_id => {
                Err(ConflictError::EnvironmentName.into())
            }
            _ => Ok(()),
        }
    }

    pub async fn create_environment(
        &self,
        actor: &admin::Model,
        input: EnvironmentInput,
    ) -> Result<environment::Model, AppError> {
        let name = validation::required_name("name", &input.name)?;
        self.ensure_name_free(&name, None).await?;

        let model = environment::ActiveModel {
            name_unaccent: Set(text::fold(&name)),
            name: Set(name),
            creator_admin_id: Set(actor.id),
            last_accessed_by_user_id: Set(None),
            last_access_time: Set(None),
            ..Default::default()
        };
        let environment = self.environment_dao.create(model).await.map_err(name_conflict)?;
        tracing::info!(environment_id = %environment.id, admin = %actor.email, "environment created");
        Ok(environment)
    }

    pub async fn get_environment(&self, id: Uuid) -> Result<environment::Model, AppError> {
        self.environment_dao
            .find_by_id(id)
            .await
            .map_err(not_found_as(NotFoundError::Environment))
    }

    pub async fn list_environments(
        &self,
        filter: EnvironmentFilter,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<environment::Model>, AppError> {
        let mut filters = Vec::new();
        if let Some(name) = filter.name.as_deref().filter(|name| !name.trim().is_empty()) {
            filters.push(ColumnFilter::like(
                environment::Column::NameUnaccent,
                text::contains_pattern(name),
                LIKE_ESCAPE,
            ));
        }
        let order: Order = filter.sort_order.unwrap_or_default().into();

        Ok(self
            .environment_dao
            .find_with_filters(page, page_size, Some((environment::Column::Name, order)), &filters)
            .await?)
    }

    pub async fn rename_environment(
        &self,
        id: Uuid,
        input: EnvironmentInput,
    ) -> Result<environment::Model, AppError> {
        self.get_environment(id).await?;
        let name = validation::required_name("name", &input.name)?;
        self.ensure_name_free(&name, Some(id)).await?;

        let environment = self
            .environment_dao
            .update(id, move |active| {
                active.name_unaccent = Set(text::fold(&name));
                active.name = Set(name);
            })
            .await
            .map_err(name_conflict)?;
        tracing::info!(environment_id = %id, "environment renamed");
        Ok(environment)
    }

    /// Deletes the environment; its devices are unlinked and its permissions cascade.
    pub async fn delete_environment(&self, id: Uuid) -> Result<(), AppError> {
        self.get_environment(id).await?;

        let unlinked = self
            .device_dao
            .detach_from_environment(self.device_dao.db(), id, &[])
            .await?;
        self.environment_dao
            .delete(id)
            .await
            .map_err(not_found_as(NotFoundError::Environment))?;
        tracing::info!(environment_id = %id, devices_unlinked = unlinked, "environment deleted");
        Ok(())
    }

    pub async fn environment_users(
        &self,
        id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<user::Model>, AppError> {
        self.access.environment_users(id, page, page_size).await
    }
}
