use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::{dao::PaginatedResponse, entities::environment},
    error::AppError,
    middleware::{CurrentAdmin, Pagination},
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        access_service::AttachOutcome,
        environment_service::{EnvironmentFilter, EnvironmentInput},
        user_service::UserPublic,
    },
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct DeviceIdsRequest {
    #[serde(default)]
    pub device_ids: Option<Vec<String>>,
}

impl DeviceIdsRequest {
    /// Blank entries are dropped, so the form-style `[""]` means "no devices".
    fn into_ids(self) -> Result<Option<Vec<Uuid>>, AppError> {
        self.device_ids
            .map(|ids| {
                ids.iter()
                    .map(|raw| raw.trim())
                    .filter(|raw| !raw.is_empty())
                    .map(|raw| {
                        Uuid::parse_str(raw)
                            .map_err(|_| AppError::bad_request(format!("Invalid device id: {raw}")))
                    })
                    .collect::<Result<Vec<Uuid>, AppError>>()
            })
            .transpose()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/environments", get(list_environments).post(create_environment))
        .route(
            "/environments/{id}",
            get(get_environment)
                .put(rename_environment)
                .delete(delete_environment),
        )
        .route("/environments/{id}/users", get(environment_users))
        .route("/environments/{id}/devices", put(relate_devices))
        .with_state(state)
}

async fn create_environment(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(actor): CurrentAdmin,
    Json(body): Json<EnvironmentInput>,
) -> ApiResult<environment::Model> {
    let environment = ServiceContext::from_state(&state)
        .environment()
        .create_environment(&actor, body)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::CREATED,
        "Environment created successfully",
        environment,
    )
}

async fn list_environments(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    page: Pagination,
    Query(filter): Query<EnvironmentFilter>,
) -> ApiResult<PaginatedResponse<environment::Model>> {
    let environments = ServiceContext::from_state(&state)
        .environment()
        .list_environments(filter, page.page, page.page_size)
        .await?;
    JsonApiResponse::ok(environments)
}

async fn get_environment(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<environment::Model> {
    let environment = ServiceContext::from_state(&state)
        .environment()
        .get_environment(id)
        .await?;
    JsonApiResponse::ok(environment)
}

async fn rename_environment(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<EnvironmentInput>,
) -> ApiResult<environment::Model> {
    let environment = ServiceContext::from_state(&state)
        .environment()
        .rename_environment(id, body)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Environment updated successfully",
        environment,
    )
}

async fn delete_environment(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(&state)
        .environment()
        .delete_environment(id)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Environment deleted successfully",
        serde_json::Value::Null,
    )
}

async fn environment_users(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
    page: Pagination,
) -> ApiResult<PaginatedResponse<UserPublic>> {
    let users = ServiceContext::from_state(&state)
        .environment()
        .environment_users(id, page.page, page.page_size)
        .await?;
    JsonApiResponse::ok(users.map(UserPublic::from))
}

async fn relate_devices(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<DeviceIdsRequest>,
) -> ApiResult<AttachOutcome> {
    let outcome = ServiceContext::from_state(&state)
        .device()
        .relate_to_environment(id, body.into_ids()?)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Environment devices updated successfully",
        outcome,
    )
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::DeviceIdsRequest;

    fn request(ids: Option<Vec<&str>>) -> DeviceIdsRequest {
        DeviceIdsRequest {
            device_ids: ids.map(|ids| ids.into_iter().map(str::to_string).collect()),
        }
    }

    #[test]
    fn blank_sentinel_means_no_devices() {
        assert_eq!(request(Some(vec![""])).into_ids().ok(), Some(Some(Vec::new())));
    }

    #[test]
    fn absent_list_means_untouched() {
        assert_eq!(request(None).into_ids().ok(), Some(None));
    }

    #[test]
    fn ids_are_parsed_and_garbage_rejected() {
        let id = Uuid::new_v4();

        assert_eq!(
            request(Some(vec![&id.to_string()])).into_ids().ok(),
            Some(Some(vec![id]))
        );
        assert!(request(Some(vec!["not-a-uuid"])).into_ids().is_err());
    }
}
