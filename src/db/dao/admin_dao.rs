use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{admin, prelude::Admin};

#[derive(Clone)]
pub struct AdminDao {
    db: DatabaseConnection,
}

impl DaoBase for AdminDao {
    type Entity = Admin;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl AdminDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<admin::Model>> {
        Admin::find()
            .filter(admin::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(DaoLayerError::Db)
    }

    pub async fn create_admin(
        &self,
        email: &str,
        password_hash: &str,
        super_admin: bool,
    ) -> DaoResult<admin::Model> {
        let model = admin::ActiveModel {
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            super_admin: Set(super_admin),
            ..Default::default()
        };
        self.create(model).await
    }
}
