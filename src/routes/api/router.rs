use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{admins, auth, devices, environments, health, users};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(auth::router(state.clone()))
        .merge(admins::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(environments::router(state.clone()))
        .merge(devices::router(state))
}
