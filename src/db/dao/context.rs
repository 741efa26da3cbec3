use sea_orm::DatabaseConnection;

use super::{AdminDao, DaoBase, DeviceDao, EnvironmentDao, UserDao, UserEnvironmentDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn admin(&self) -> AdminDao {
        DaoBase::new(&self.db)
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn environment(&self) -> EnvironmentDao {
        DaoBase::new(&self.db)
    }

    pub fn device(&self) -> DeviceDao {
        DaoBase::new(&self.db)
    }

    pub fn user_environment(&self) -> UserEnvironmentDao {
        UserEnvironmentDao::new(&self.db)
    }
}
