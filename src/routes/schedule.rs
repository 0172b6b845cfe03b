use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::models::auth::AuthenticatedOwner;
use crate::models::schedule::{ReplaceWeekRequest, WorkingDay};
use crate::services::schedule::ScheduleService;
use crate::AppState;

/// Stored rows only; days without a row are closed by convention, the
/// client renders them that way.
pub async fn get_week(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
) -> Result<Json<Vec<WorkingDay>>, ApiError> {
    let days = ScheduleService::list_week(&state.db, owner.owner_id).await?;
    Ok(Json(days))
}

pub async fn replace_week(
    State(state): State<AppState>,
    owner: AuthenticatedOwner,
    Json(body): Json<ReplaceWeekRequest>,
) -> Result<Json<Vec<WorkingDay>>, ApiError> {
    let days = ScheduleService::replace_week(&state.db, owner.owner_id, &body).await?;
    Ok(Json(days))
}
