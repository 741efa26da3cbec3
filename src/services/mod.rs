pub mod access_service;
pub mod admin_service;
pub mod context;
pub mod device_service;
pub mod environment_service;
pub mod user_service;
pub mod validation;

pub use context::ServiceContext;

use serde::Deserialize;

use crate::{
    db::dao::DaoLayerError,
    error::{AppError, NotFoundError},
};

/// Translates a DAO miss into the caller's domain-specific not-found error.
pub(crate) fn not_found_as(missing: NotFoundError) -> impl FnOnce(DaoLayerError) -> AppError {
    move |err| match err {
        DaoLayerError::NotFound { .. } => AppError::NotFound(missing),
        other => other.into(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl From<SortOrder> for sea_orm::Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => sea_orm::Order::Asc,
            SortOrder::Desc => sea_orm::Order::Desc,
        }
    }
}
