use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::appointment::{
    Appointment, AppointmentRangeQuery, DashboardSummary, UpdateStatusRequest,
};
use crate::models::auth::AuthenticatedOwner;
use crate::services::appointments::{local_today, AppointmentService};
use crate::AppState;

pub async fn list_appointments(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
    Query(range): Query<AppointmentRangeQuery>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    let appointments =
        AppointmentService::list_range(&state.db, owner.owner_id, range.from, range.to).await?;
    Ok(Json(appointments))
}

pub async fn update_status(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment =
        AppointmentService::update_status(&state.db, owner.owner_id, id, body.status).await?;
    Ok(Json(appointment))
}

pub async fn dashboard_summary(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
) -> Result<Json<DashboardSummary>, ApiError> {
    let today = local_today(Utc::now(), state.config.shop_utc_offset_minutes);
    let summary = AppointmentService::dashboard_summary(&state.db, owner.owner_id, today).await?;
    Ok(Json(summary))
}
