use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    db::{dao::PaginatedResponse, entities::device},
    middleware::{CurrentAdmin, Pagination},
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        device_service::{DeviceFilter, NewDevice},
    },
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/devices", get(list_devices).post(create_device))
        .route("/devices/{id}", get(get_device).delete(delete_device))
        .with_state(state)
}

async fn create_device(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(actor): CurrentAdmin,
    Json(body): Json<NewDevice>,
) -> ApiResult<device::Model> {
    let device = ServiceContext::from_state(&state)
        .device()
        .create_device(&actor, body)
        .await?;
    JsonApiResponse::with_status(StatusCode::CREATED, "Device created successfully", device)
}

async fn list_devices(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    page: Pagination,
    Query(filter): Query<DeviceFilter>,
) -> ApiResult<PaginatedResponse<device::Model>> {
    let devices = ServiceContext::from_state(&state)
        .device()
        .list_devices(filter, page.page, page.page_size)
        .await?;
    JsonApiResponse::ok(devices)
}

async fn get_device(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<device::Model> {
    let device = ServiceContext::from_state(&state)
        .device()
        .get_device(id)
        .await?;
    JsonApiResponse::ok(device)
}

async fn delete_device(
    State(state): State<Arc<AppState>>,
    CurrentAdmin(_): CurrentAdmin,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(&state)
        .device()
        .delete_device(id)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::OK,
        "Device deleted successfully",
        serde_json::Value::Null,
    )
}
