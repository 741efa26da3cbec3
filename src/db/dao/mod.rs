pub mod admin_dao;
pub mod base;
pub mod base_traits;
mod context;
pub mod device_dao;
pub mod environment_dao;
pub mod error;
pub mod user_dao;
pub mod user_environment_dao;

pub use admin_dao::AdminDao;
pub use base::{ColumnFilter, DaoBase, FilterOp, PaginatedResponse};
pub use base_traits::{HasCreatedAtColumn, HasIdActiveModel, TimestampedActiveModel};
pub use context::DaoContext;
pub use device_dao::DeviceDao;
pub use environment_dao::EnvironmentDao;
pub use error::{DaoLayerError, DaoResult, map_db_err};
pub use user_dao::UserDao;
pub use user_environment_dao::UserEnvironmentDao;
