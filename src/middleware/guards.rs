use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::Deserialize;

use crate::{
    auth::require_privilege,
    db::entities::admin,
    error::{AppError, AuthError},
    state::AppState,
};

const DEFAULT_PAGE_SIZE: u64 = 20;

/// Admin resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub admin::Model);

impl FromRequestParts<Arc<AppState>> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<CurrentAdmin>().cloned() {
            return Ok(current);
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::debug!("missing or non-bearer authorization header");
                AuthError::InvalidCredentials
            })?;

        let admin = state.auth.authenticate(token).await?;
        let current = CurrentAdmin(admin);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// `CurrentAdmin` that also holds super-admin privilege.
#[derive(Debug, Clone)]
pub struct SuperAdmin(pub admin::Model);

impl FromRequestParts<Arc<AppState>> for SuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentAdmin(admin) = CurrentAdmin::from_request_parts(parts, state).await?;
        require_privilege(&admin)?;
        Ok(SuperAdmin(admin))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Pagination {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pagination) = Query::<Pagination>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(pagination)
    }
}
