use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{dao::PaginatedResponse, entities::environment},
    middleware::{CurrentAdmin, Pagination},
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        user_service::{NewUser, UserFilter, UserPatch, UserPublic, UserWithEnvironments},
    },
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct UserEnvironmentsResponse {
    pub user: UserPublic,
    pub environment_ids: Vec<Uuid>,
    pub invalid_environment_ids: Vec<Uuid>,
}

impl From<UserWithEnvironments> for UserEnvironmentsResponse {
    fn from(value: UserWithEnvironments) -> Self {
        Self {
            user: value.user.into(),
            environment_ids: value.environments.existing_ids,
            invalid_environment_ids: value.environments.invalid_ids,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/users/{id}/environments", get(user_environments))
        .route(
            "/users/{user_id}/environments/{environment_id}",
            post(add_environment).delete(remove_environment),
        )
        .with_state(state)
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(actor): CurrentAdmin,
    Json(body): Json<NewUser>,
) -> ApiResult<UserEnvironmentsResponse> {
    let created = ServiceContext::from_state(&state)
        .user()
        .create_user(&actor, body)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::CREATED,
        "User created successfully",
        created.into(),
    )
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    page: Pagination,
    Query(filter): Query<UserFilter>,
) -> ApiResult<PaginatedResponse<UserPublic>> {
    let users = ServiceContext::from_state(&state)
        .user()
        .list_users(filter, page.page, page.page_size)
        .await?;
    JsonApiResponse::ok(users.map(UserPublic::from))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<UserPublic> {
    let user = ServiceContext::from_state(&state).user().get_user(id).await?;
    JsonApiResponse::ok(user.into())
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<UserPatch>,
) -> ApiResult<UserEnvironmentsResponse> {
    let updated = ServiceContext::from_state(&state)
        .user()
        .update_user(id, body)
        .await?;
    JsonApiResponse::with_status(StatusCode::OK, "User updated successfully", updated.into())
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(&state)
        .user()
        .delete_user(id)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "User deleted successfully",
        serde_json::Value::Null,
    )
}

async fn user_environments(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
    page: Pagination,
) -> ApiResult<PaginatedResponse<environment::Model>> {
    let environments = ServiceContext::from_state(&state)
        .access()
        .user_environments(id, page.page, page.page_size)
        .await?;
    JsonApiResponse::ok(environments)
}

async fn add_environment(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path((user_id, environment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<environment::Model> {
    let environment = ServiceContext::from_state(&state)
        .access()
        .add_single(user_id, environment_id)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::CREATED,
        "Environment added to user successfully",
        environment,
    )
}

async fn remove_environment(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path((user_id, environment_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(&state)
        .access()
        .remove_single(user_id, environment_id)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Environment removed from user successfully",
        serde_json::Value::Null,
    )
}
