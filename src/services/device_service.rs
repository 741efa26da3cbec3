use sea_orm::{Set, TransactionTrait};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::{
        dao::{ColumnFilter, DaoBase, DaoLayerError, DeviceDao, EnvironmentDao, PaginatedResponse},
        entities::{admin, device},
    },
    error::{AppError, ConflictError, NotFoundError},
    services::{
        access_service::{AttachOutcome, dedupe},
        not_found_as, validation,
    },
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
    pub serial_number: String,
    #[serde(default)]
    pub environment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceFilter {
    pub environment_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct DeviceService {
    device_dao: DeviceDao,
    environment_dao: EnvironmentDao,
}

impl DeviceService {
    pub fn new(device_dao: DeviceDao, environment_dao: EnvironmentDao) -> Self {
        Self {
            device_dao,
            environment_dao,
        }
    }

    async fn ensure_environment(&self, id: Uuid) -> Result<(), AppError> {
        self.environment_dao
            .find_by_id(id)
            .await
            .map(|_| ())
            .map_err(not_found_as(NotFoundError::Environment))
    }

    pub async fn create_device(
        &self,
        actor: &admin::Model,
        input: NewDevice,
    ) -> Result<device::Model, AppError> {
        let serial_number = validation::required_name("serial_number", &input.serial_number)?;
        if self.device_dao.find_by_serial(&serial_number).await?.is_some() {
            return Err(ConflictError::SerialNumber.into());
        }
        if let Some(environment_id) = input.environment_id {
            self.ensure_environment(environment_id).await?;
        }

        let model = device::ActiveModel {
            serial_number: Set(serial_number),
            environment_id: Set(input.environment_id),
            creator_admin_id: Set(actor.id),
            ..Default::default()
        };
        let device = match self.device_dao.create(model).await {
            Ok(device) => device,
            Err(DaoLayerError::UniqueViolation(_)) => {
                return Err(ConflictError::SerialNumber.into());
            }
            Err(err) => return Err(err.into()),
        };
        tracing::info!(device_id = %device.id, admin = %actor.email, "device created");
        Ok(device)
    }

    pub async fn get_device(&self, id: Uuid) -> Result<device::Model, AppError> {
        self.device_dao
            .find_by_id(id)
            .await
            .map_err(not_found_as(NotFoundError::Device))
    }

    pub async fn list_devices(
        &self,
        filter: DeviceFilter,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<device::Model>, AppError> {
        let filters: Vec<_> = filter
            .environment_id
            .map(|id| ColumnFilter::eq(device::Column::EnvironmentId, id))
            .into_iter()
            .collect();

        Ok(self
            .device_dao
            .find_with_filters(page, page_size, None, &filters)
            .await?)
    }

    pub async fn delete_device(&self, id: Uuid) -> Result<(), AppError> {
        self.device_dao
            .delete(id)
            .await
            .map_err(not_found_as(NotFoundError::Device))?;
        tracing::info!(device_id = %id, "device deleted");
        Ok(())
    }

    /// Makes the environment's devices exactly the resolvable subset of
    /// `device_ids`, moving devices away from any previous environment.
    /// `None` leaves the environment untouched.
    pub async fn relate_to_environment(
        &self,
        environment_id: Uuid,
        device_ids: Option<Vec<Uuid>>,
    ) -> Result<AttachOutcome, AppError> {
        self.ensure_environment(environment_id).await?;
        let Some(ids) = device_ids else {
            return Ok(AttachOutcome::default());
        };
        let requested = dedupe(ids);

        let txn = self
            .device_dao
            .db()
            .begin()
            .await
            .map_err(DaoLayerError::Db)?;
        let existing = self.device_dao.existing_ids(&txn, &requested).await?;
        let unlinked = self
            .device_dao
            .detach_from_environment(&txn, environment_id, &existing)
            .await?;
        self.device_dao
            .attach_to_environment(&txn, environment_id, &existing)
            .await?;
        txn.commit().await.map_err(DaoLayerError::Db)?;

        let outcome = AttachOutcome::partition(&requested, existing);
        tracing::info!(
            %environment_id,
            linked = outcome.existing_ids.len(),
            unlinked,
            invalid = outcome.invalid_ids.len(),
            "environment devices replaced"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::NewDevice;
    use crate::{
        db::entities::{device, environment},
        error::{AppError, ConflictError, NotFoundError},
        services::{ServiceContext, access_service::AttachOutcome},
        test_helpers::{admin_model, device_model, environment_model},
    };

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn duplicate_serial_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[device_model("SN-1", None)]])
            .into_connection();
        let service = ServiceContext::new(&db).device();

        let err = service
            .create_device(
                &admin_model("root@example.com", true),
                NewDevice {
                    serial_number: "SN-1".to_string(),
                    environment_id: None,
                },
            )
            .await
            .expect_err("duplicate serial should conflict");

        assert!(matches!(err, AppError::Conflict(ConflictError::SerialNumber)));
    }

    #[tokio::test]
    async fn create_requires_known_environment() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<device::Model>::new()])
            .append_query_results([Vec::<environment::Model>::new()])
            .into_connection();
        let service = ServiceContext::new(&db).device();

        let err = service
            .create_device(
                &admin_model("root@example.com", true),
                NewDevice {
                    serial_number: "SN-2".to_string(),
                    environment_id: Some(Uuid::new_v4()),
                },
            )
            .await
            .expect_err("unknown environment should fail");

        assert!(matches!(err, AppError::NotFound(NotFoundError::Environment)));
    }

    #[tokio::test]
    async fn relate_none_is_a_no_op() {
        let lab = environment_model("Lab");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[lab.clone()]])
            .into_connection();
        let service = ServiceContext::new(&db).device();

        let outcome = service
            .relate_to_environment(lab.id, None)
            .await
            .expect("no-op should succeed");

        assert_eq!(outcome, AttachOutcome::default());
        let statements = format!("{:?}", db.into_transaction_log());
        assert!(!statements.contains("UPDATE"));
    }

    #[tokio::test]
    async fn relate_replaces_device_set() {
        let lab = environment_model("Lab");
        let sensor = device_model("SN-3", None);
        let missing = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[lab.clone()]])
            .append_query_results([[sensor.clone()]])
            .append_exec_results([exec(1), exec(1)])
            .into_connection();
        let service = ServiceContext::new(&db).device();

        let outcome = service
            .relate_to_environment(lab.id, Some(vec![sensor.id, missing]))
            .await
            .expect("relate should succeed");

        assert_eq!(outcome.existing_ids, vec![sensor.id]);
        assert_eq!(outcome.invalid_ids, vec![missing]);
    }

    #[tokio::test]
    async fn relate_with_empty_list_unlinks_everything() {
        let lab = environment_model("Lab");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[lab.clone()]])
            .append_exec_results([exec(4)])
            .into_connection();
        let service = ServiceContext::new(&db).device();

        let outcome = service
            .relate_to_environment(lab.id, Some(Vec::new()))
            .await
            .expect("relate should succeed");

        assert_eq!(outcome, AttachOutcome::default());
        let statements = format!("{:?}", db.into_transaction_log());
        assert!(statements.contains("UPDATE"));
    }
}
