use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::auth::AuthenticatedOwner;
use crate::models::service::{CreateServiceRequest, Service, UpdateServiceRequest};
use crate::services::catalog::CatalogService;
use crate::AppState;

pub async fn list_services(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
) -> Result<Json<Vec<Service>>, ApiError> {
    let services = CatalogService::list(&state.db, owner.owner_id).await?;
    Ok(Json(services))
}

pub async fn create_service(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
    Json(body): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let service = CatalogService::create(&state.db, owner.owner_id, &body).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn update_service(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    let service = CatalogService::update(&state.db, owner.owner_id, id, &body).await?;
    Ok(Json(service))
}

pub async fn delete_service(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    CatalogService::delete(&state.db, owner.owner_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
