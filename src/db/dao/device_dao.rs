use std::collections::HashSet;

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{device, prelude::Device};

#[derive(Clone)]
pub struct DeviceDao {
    db: DatabaseConnection,
}

impl DaoBase for DeviceDao {
    type Entity = Device;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl DeviceDao {
    pub async fn find_by_serial(&self, serial_number: &str) -> DaoResult<Option<device::Model>> {
        Device::find()
            .filter(device::Column::SerialNumber.eq(serial_number))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    /// The subset of `ids` naming stored devices, in input order.
    pub async fn existing_ids(
        &self,
        conn: &impl ConnectionTrait,
        ids: &[Uuid],
    ) -> DaoResult<Vec<Uuid>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: HashSet<Uuid> = Device::find()
            .filter(device::Column::Id.is_in(ids.iter().copied()))
            .all(conn)
            .await
            .map_err(DaoLayerError::Db)?
            .into_iter()
            .map(|device| device.id)
            .collect();

        Ok(ids.iter().copied().filter(|id| found.contains(id)).collect())
    }

    /// Unlinks every device of the environment except `keep`.
    pub async fn detach_from_environment(
        &self,
        conn: &impl ConnectionTrait,
        environment_id: Uuid,
        keep: &[Uuid],
    ) -> DaoResult<u64> {
        let mut query = Device::update_many()
            .col_expr(device::Column::EnvironmentId, Expr::value(Option::<Uuid>::None))
            .filter(device::Column::EnvironmentId.eq(environment_id));
        if !keep.is_empty() {
            query = query.filter(device::Column::Id.is_not_in(keep.iter().copied()));
        }

        query
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }

    pub async fn attach_to_environment(
        &self,
        conn: &impl ConnectionTrait,
        environment_id: Uuid,
        ids: &[Uuid],
    ) -> DaoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        Device::update_many()
            .col_expr(device::Column::EnvironmentId, Expr::value(Some(environment_id)))
            .filter(device::Column::Id.is_in(ids.iter().copied()))
            .exec(conn)
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::Db)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::DeviceDao;
    use crate::db::dao::DaoBase;

    #[tokio::test]
    async fn attach_skips_update_for_empty_list() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let dao = DeviceDao::new(&db);

        let affected = dao
            .attach_to_environment(&db, Uuid::new_v4(), &[])
            .await
            .expect("no statement needed");
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn detach_reports_rows_affected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            }])
            .into_connection();
        let dao = DeviceDao::new(&db);

        let affected = dao
            .detach_from_environment(&db, Uuid::new_v4(), &[Uuid::new_v4()])
            .await
            .expect("update should succeed");
        assert_eq!(affected, 3);
    }
}
