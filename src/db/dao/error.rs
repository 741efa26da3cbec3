use sea_orm::{DbErr, SqlErr};
use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum DaoLayerError {
    Db(DbErr),
    /// A unique or primary key constraint rejected the write.
    UniqueViolation(String),
    NotFound { entity: &'static str, id: Uuid },
    InvalidPagination { page: u64, page_size: u64 },
}

pub type DaoResult<T> = Result<T, DaoLayerError>;

/// Splits constraint violations out of generic driver errors.
pub fn map_db_err(err: DbErr) -> DaoLayerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => DaoLayerError::UniqueViolation(detail),
        _ => DaoLayerError::Db(err),
    }
}

impl fmt::Display for DaoLayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoLayerError::Db(err) => write!(f, "Database error: {err}"),
            DaoLayerError::UniqueViolation(detail) => {
                write!(f, "Unique constraint violated: {detail}")
            }
            DaoLayerError::NotFound { entity, id } => {
                write!(f, "{entity} not found (id={id})")
            }
            DaoLayerError::InvalidPagination { page, page_size } => write!(
                f,
                "Invalid pagination: page={page} page_size={page_size}"
            ),
        }
    }
}

impl std::error::Error for DaoLayerError {}

#[cfg(test)]
mod tests {
    use sea_orm::{DbErr, RuntimeErr};

    use super::{DaoLayerError, map_db_err};

    #[test]
    fn plain_db_errors_stay_generic() {
        let err = map_db_err(DbErr::Conn(RuntimeErr::Internal("refused".to_string())));
        assert!(matches!(err, DaoLayerError::Db(_)));
    }

    #[test]
    fn pagination_error_reports_inputs() {
        let err = DaoLayerError::InvalidPagination {
            page: 0,
            page_size: 500,
        };
        assert_eq!(err.to_string(), "Invalid pagination: page=0 page_size=500");
    }
}
