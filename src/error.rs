use thiserror::Error;

use crate::db::entities::user;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Could not validate credentials";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
    #[error("token subject missing")]
    MissingSubject,
    #[error("Could not validate credentials")]
    InvalidCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("Not enough permissions")]
    Forbidden,
}

/// User fields that must be globally unique, in reporting precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueField {
    Email,
    Cpf,
    PhoneNumber,
}

impl UniqueField {
    pub fn label(self) -> &'static str {
        match self {
            UniqueField::Email => "Email",
            UniqueField::Cpf => "CPF",
            UniqueField::PhoneNumber => "Phone Number",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("{} already in use!", .field.label())]
    Field {
        field: UniqueField,
        existing: Box<user::Model>,
    },
    #[error("Admin email already in use!")]
    AdminEmail,
    #[error("Environment name already in use!")]
    EnvironmentName,
    #[error("Serial number already in use!")]
    SerialNumber,
    #[error("User already has this environment!")]
    Permission,
    #[error("Record already exists")]
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("Admin not found!")]
    Admin,
    #[error("User not found!")]
    User,
    #[error("Environment not found!")]
    Environment,
    #[error("Device not found!")]
    Device,
    #[error("User does not have this environment!")]
    Permission,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::new(message))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Message safe to hand to a client. Auth failures never say which check
    /// failed and internal details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            Self::Auth(_) => INVALID_CREDENTIALS_MESSAGE.to_string(),
            Self::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<crate::db::dao::DaoLayerError> for AppError {
    fn from(err: crate::db::dao::DaoLayerError) -> Self {
        use crate::db::dao::DaoLayerError;

        match err {
            DaoLayerError::InvalidPagination { .. } => AppError::bad_request(err.to_string()),
            DaoLayerError::UniqueViolation(_) => AppError::Conflict(ConflictError::Duplicate),
            DaoLayerError::NotFound { .. } | DaoLayerError::Db(_) => {
                AppError::internal(err.to_string())
            }
        }
    }
}
