use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::{dao::PaginatedResponse, entities::admin},
    middleware::{CurrentAdmin, Pagination, SuperAdmin},
    response::{ApiResult, JsonApiResponse},
    services::{ServiceContext, admin_service::NewAdmin},
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/admins/me", get(me))
        .route("/admins", get(list_admins).post(create_admin))
        .route("/admins/{id}", get(get_admin).delete(delete_admin))
        .with_state(state)
}

async fn me(CurrentAdmin(admin): CurrentAdmin) -> ApiResult<admin::Model> {
    JsonApiResponse::ok(admin)
}

async fn create_admin(
    State(state): State<Arc<AppState>>,
    SuperAdmin(actor): SuperAdmin,
    Json(body): Json<NewAdmin>,
) -> ApiResult<admin::Model> {
    let admin = ServiceContext::from_state(&state)
        .admin()
        .create_admin(&actor, body)
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "Admin created successfully", admin)
}

async fn list_admins(
    State(state): State<Arc<AppState>>,
    SuperAdmin(actor): SuperAdmin,
    page: Pagination,
) -> ApiResult<PaginatedResponse<admin::Model>> {
    let admins = ServiceContext::from_state(&state)
        .admin()
        .list_admins(&actor, page.page, page.page_size)
        .await?;
    JsonApiResponse::ok(admins)
}

async fn get_admin(
    State(state): State<Arc<AppState>>,
    SuperAdmin(_): SuperAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<admin::Model> {
    let admin = ServiceContext::from_state(&state)
        .admin()
        .find_admin(id)
        .await?;
    JsonApiResponse::ok(admin)
}

async fn delete_admin(
    State(state): State<Arc<AppState>>,
    SuperAdmin(actor): SuperAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(&state)
        .admin()
        .delete_admin(&actor, id)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Admin deleted successfully",
        serde_json::Value::Null,
    )
}
