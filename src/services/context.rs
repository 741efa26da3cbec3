use sea_orm::DatabaseConnection;

use crate::{
    db::dao::DaoContext,
    services::{
        access_service::AccessService, admin_service::AdminService,
        device_service::DeviceService, environment_service::EnvironmentService,
        user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self.daos.admin())
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user(), self.access())
    }

    pub fn environment(&self) -> EnvironmentService {
        EnvironmentService::new(self.daos.environment(), self.daos.device(), self.access())
    }

    pub fn device(&self) -> DeviceService {
        DeviceService::new(self.daos.device(), self.daos.environment())
    }

    pub fn access(&self) -> AccessService {
        AccessService::new(
            self.daos.user(),
            self.daos.environment(),
            self.daos.user_environment(),
        )
    }
}
