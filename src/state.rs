use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::auth::providers::AuthProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, auth: Arc<dyn AuthProvider>) -> Arc<Self> {
        Arc::new(Self { db, auth })
    }
}
