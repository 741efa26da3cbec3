use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::error::{DaoLayerError, DaoResult, map_db_err};
use crate::db::entities::{prelude::UserEnvironment, user_environment};

/// Junction rows have a composite key, so this DAO stays outside `DaoBase`.
#[derive(Clone)]
pub struct UserEnvironmentDao {
    db: DatabaseConnection,
}

impl UserEnvironmentDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn environment_ids(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
    ) -> DaoResult<Vec<Uuid>> {
        UserEnvironment::find()
            .filter(user_environment::Column::UserId.eq(user_id))
            .all(conn)
            .await
            .map(|rows| rows.into_iter().map(|row| row.environment_id).collect())
            .map_err(DaoLayerError::Db)
    }

    pub async fn exists(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
        environment_id: Uuid,
    ) -> DaoResult<bool> {
        UserEnvironment::find_by_id((user_id, environment_id))
            .one(conn)
            .await
            .map(|row| row.is_some())
            .map_err(DaoLayerError::Db)
    }

    pub async fn insert(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
        environment_ids: &[Uuid],
    ) -> DaoResult<()> {
        let now = Utc::now().fixed_offset();
        for environment_id in environment_ids {
            let row = user_environment::ActiveModel {
                user_id: Set(user_id),
                environment_id: Set(*environment_id),
                created_at: Set(now),
                ..Default::default()
            };
            UserEnvironment::insert(row)
                .exec_without_returning(conn)
                .await
                .map_err(map_db_err)?;
        }
        Ok(())
    }

    pub async fn delete(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
        environment_ids: &[Uuid],
    ) -> DaoResult<u64> {
        if environment_ids.is_empty() {
            return Ok(0);
        }

        UserEnvironment::delete_many()
            .filter(user_environment::Column::UserId.eq(user_id))
            .filter(user_environment::Column::EnvironmentId.is_in(environment_ids.iter().copied()))
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }
}
