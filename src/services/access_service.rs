use std::collections::HashSet;

use sea_orm::DatabaseTransaction;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{
        dao::{
            DaoBase, DaoLayerError, EnvironmentDao, PaginatedResponse, UserDao,
            UserEnvironmentDao,
        },
        entities::{environment, user},
    },
    error::{AppError, ConflictError, NotFoundError},
    services::not_found_as,
};

/// Requested ids split into those that resolved to stored rows and those that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachOutcome {
    pub existing_ids: Vec<Uuid>,
    pub invalid_ids: Vec<Uuid>,
}

impl AttachOutcome {
    pub(crate) fn partition(requested: &[Uuid], existing_ids: Vec<Uuid>) -> Self {
        let found: HashSet<Uuid> = existing_ids.iter().copied().collect();
        let invalid_ids = requested
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();
        Self {
            existing_ids,
            invalid_ids,
        }
    }
}

/// Drops repeated ids, keeping the first occurrence of each.
pub(crate) fn dedupe(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn permission_conflict(err: DaoLayerError) -> AppError {
    match err {
        DaoLayerError::UniqueViolation(_) => ConflictError::Permission.into(),
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct AccessService {
    user_dao: UserDao,
    environment_dao: EnvironmentDao,
    link_dao: UserEnvironmentDao,
}

impl AccessService {
    pub fn new(
        user_dao: UserDao,
        environment_dao: EnvironmentDao,
        link_dao: UserEnvironmentDao,
    ) -> Self {
        Self {
            user_dao,
            environment_dao,
            link_dao,
        }
    }

    /// Grants the user every resolvable environment in `environment_ids`,
    /// keeping permissions it already has. Runs on the caller's transaction.
    pub async fn attach(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        environment_ids: Option<Vec<Uuid>>,
    ) -> Result<AttachOutcome, AppError> {
        let Some(ids) = environment_ids else {
            return Ok(AttachOutcome::default());
        };
        let requested = dedupe(ids);

        let existing = self.environment_dao.existing_ids(txn, &requested).await?;
        let current: HashSet<Uuid> = self
            .link_dao
            .environment_ids(txn, user_id)
            .await?
            .into_iter()
            .collect();
        let to_add: Vec<Uuid> = existing
            .iter()
            .copied()
            .filter(|id| !current.contains(id))
            .collect();

        self.link_dao
            .insert(txn, user_id, &to_add)
            .await
            .map_err(permission_conflict)?;

        let outcome = AttachOutcome::partition(&requested, existing);
        tracing::info!(
            %user_id,
            granted = to_add.len(),
            invalid = outcome.invalid_ids.len(),
            "environment access attached"
        );
        Ok(outcome)
    }

    /// Makes the user's permissions exactly the resolvable subset of `environment_ids`.
    /// `None` leaves them untouched; an empty list revokes all.
    pub async fn replace(
        &self,
        txn: &DatabaseTransaction,
        user_id: Uuid,
        environment_ids: Option<Vec<Uuid>>,
    ) -> Result<AttachOutcome, AppError> {
        let Some(ids) = environment_ids else {
            return Ok(AttachOutcome::default());
        };
        let requested = dedupe(ids);

        let existing = self.environment_dao.existing_ids(txn, &requested).await?;
        let current = self.link_dao.environment_ids(txn, user_id).await?;

        let wanted: HashSet<Uuid> = existing.iter().copied().collect();
        let held: HashSet<Uuid> = current.iter().copied().collect();
        let to_remove: Vec<Uuid> = current
            .into_iter()
            .filter(|id| !wanted.contains(id))
            .collect();
        let to_add: Vec<Uuid> = existing
            .iter()
            .copied()
            .filter(|id| !held.contains(id))
            .collect();

        self.link_dao.delete(txn, user_id, &to_remove).await?;
        self.link_dao
            .insert(txn, user_id, &to_add)
            .await
            .map_err(permission_conflict)?;

        let outcome = AttachOutcome::partition(&requested, existing);
        tracing::info!(
            %user_id,
            granted = to_add.len(),
            revoked = to_remove.len(),
            invalid = outcome.invalid_ids.len(),
            "environment access replaced"
        );
        Ok(outcome)
    }

    pub async fn add_single(
        &self,
        user_id: Uuid,
        environment_id: Uuid,
    ) -> Result<environment::Model, AppError> {
        let (_, environment) = self.resolve_pair(user_id, environment_id).await?;

        let conn = self.link_dao.db();
        if self.link_dao.exists(conn, user_id, environment_id).await? {
            return Err(ConflictError::Permission.into());
        }
        self.link_dao
            .insert(conn, user_id, &[environment_id])
            .await
            .map_err(permission_conflict)?;

        tracing::info!(%user_id, %environment_id, "environment access granted");
        Ok(environment)
    }

    pub async fn remove_single(&self, user_id: Uuid, environment_id: Uuid) -> Result<(), AppError> {
        self.resolve_pair(user_id, environment_id).await?;

        let removed = self
            .link_dao
            .delete(self.link_dao.db(), user_id, &[environment_id])
            .await?;
        if removed == 0 {
            return Err(NotFoundError::Permission.into());
        }

        tracing::info!(%user_id, %environment_id, "environment access revoked");
        Ok(())
    }

    pub async fn user_environments(
        &self,
        user_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<environment::Model>, AppError> {
        self.user_dao
            .find_by_id(user_id)
            .await
            .map_err(not_found_as(NotFoundError::User))?;
        Ok(self
            .environment_dao
            .list_for_user(user_id, page, page_size)
            .await?)
    }

    pub async fn environment_users(
        &self,
        environment_id: Uuid,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<user::Model>, AppError> {
        self.environment_dao
            .find_by_id(environment_id)
            .await
            .map_err(not_found_as(NotFoundError::Environment))?;
        Ok(self
            .user_dao
            .list_for_environment(environment_id, page, page_size)
            .await?)
    }

    async fn resolve_pair(
        &self,
        user_id: Uuid,
        environment_id: Uuid,
    ) -> Result<(user::Model, environment::Model), AppError> {
        let user = self
            .user_dao
            .find_by_id(user_id)
            .await
            .map_err(not_found_as(NotFoundError::User))?;
        let environment = self
            .environment_dao
            .find_by_id(environment_id)
            .await
            .map_err(not_found_as(NotFoundError::Environment))?;
        Ok((user, environment))
    }
}
