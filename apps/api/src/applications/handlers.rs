//! Axum route handlers for the Applications API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::applications::service::{
    self, ApplicationView, CreateApplicationRequest, ListApplicationsQuery, UpdateStatusRequest,
};
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::state::AppState;

/// POST /api/v1/applications/create
pub async fn handle_create_application(
    State(state): State<AppState>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<Json<ApplicationView>, AppError> {
    let view =
        service::create_application(state.store.as_ref(), state.clock.as_ref(), request).await?;
    Ok(Json(view))
}

/// GET /api/v1/applications?status=&limit=&skip=
///
/// Most recently updated first.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let rows = service::list_applications(state.store.as_ref(), query).await?;
    Ok(Json(rows))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationView>, AppError> {
    Ok(Json(service::get_application(state.store.as_ref(), id).await?))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationView>, AppError> {
    let view =
        service::update_status(state.store.as_ref(), state.clock.as_ref(), id, request).await?;
    Ok(Json(view))
}
