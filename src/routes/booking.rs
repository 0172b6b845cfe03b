use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::rate_limit::{check_rate_limit, real_ip};
use crate::middleware::shop::ShopBySlug;
use crate::models::appointment::{Appointment, TimeSlot};
use crate::models::owner::ShopPublicInfo;
use crate::models::service::PublicService;
use crate::services::appointments::AppointmentService;
use crate::services::availability::AvailabilityService;
use crate::services::booking_flow::{BookingFlow, FlowService, FlowSlot, FlowStore};
use crate::services::catalog::CatalogService;
use crate::services::metrics::{BOOKINGS_COUNTER, BOOKING_CONFLICTS_COUNTER};
use crate::AppState;

pub async fn get_shop(ShopBySlug(owner): ShopBySlug) -> Json<ShopPublicInfo> {
    Json(ShopPublicInfo {
        shop_name: owner.shop_name,
        shop_slug: owner.shop_slug,
        phone: owner.phone,
    })
}

pub async fn list_services(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
) -> Result<Json<Vec<PublicService>>, ApiError> {
    let services = CatalogService::list_public(&state.db, owner.id).await?;
    Ok(Json(services))
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub service_id: Uuid,
    pub date: NaiveDate,
}

pub async fn availability(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    headers: HeaderMap,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<TimeSlot>>, ApiError> {
    let ip = real_ip(&headers);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &format!("rate:availability:ip:{ip}"), 60, 60).await?;

    let service = CatalogService::get(&state.db, owner.id, query.service_id).await?;
    if !service.is_active {
        return Err(ApiError::NotFound("Service not found".into()));
    }

    let slots =
        AvailabilityService::slots_for_date(&state.db, owner.id, service.duration_minutes, query.date)
            .await?;
    Ok(Json(slots))
}

// ── Booking sessions ────────────────────────────────────────────────────

pub async fn start_booking(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<BookingFlow>), ApiError> {
    let ip = real_ip(&headers);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &format!("rate:booking:start:ip:{ip}"), 20, 3600).await?;

    let flow = BookingFlow::new();
    FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

pub async fn get_booking(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
) -> Result<Json<BookingFlow>, ApiError> {
    let mut redis = state.redis.clone();
    let flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;
    Ok(Json(flow))
}

#[derive(Deserialize)]
pub struct PickServiceRequest {
    pub service_id: Uuid,
}

pub async fn pick_service(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
    Json(body): Json<PickServiceRequest>,
) -> Result<Json<BookingFlow>, ApiError> {
    let mut redis = state.redis.clone();
    let mut flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;

    let service = CatalogService::get(&state.db, owner.id, body.service_id).await?;
    if !service.is_active {
        return Err(ApiError::NotFound("Service not found".into()));
    }

    flow.pick_service(FlowService::from(&service))?;
    FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await?;
    Ok(Json(flow))
}

#[derive(Deserialize)]
pub struct PickDateRequest {
    pub date: NaiveDate,
}

#[derive(serde::Serialize)]
pub struct PickDateResponse {
    pub flow: BookingFlow,
    pub slots: Vec<TimeSlot>,
}

/// Picking a date answers with the slot grid for that date so the client
/// does not need a second round trip.
pub async fn pick_date(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
    Json(body): Json<PickDateRequest>,
) -> Result<Json<PickDateResponse>, ApiError> {
    let mut redis = state.redis.clone();
    let mut flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;

    flow.pick_date(body.date)?;
    let duration = flow
        .service
        .as_ref()
        .map(|s| s.duration_minutes)
        .ok_or_else(|| ApiError::Conflict("Select a service first".into()))?;
    FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await?;

    let slots = AvailabilityService::slots_for_date(&state.db, owner.id, duration, body.date).await?;
    Ok(Json(PickDateResponse { flow, slots }))
}

#[derive(Deserialize)]
pub struct PickSlotRequest {
    pub starts_at: NaiveDateTime,
}

pub async fn pick_slot(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
    Json(body): Json<PickSlotRequest>,
) -> Result<Json<BookingFlow>, ApiError> {
    let mut redis = state.redis.clone();
    let mut flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;

    let service = flow
        .service
        .clone()
        .ok_or_else(|| ApiError::Conflict("Select a service first".into()))?;
    let ends_at = body
        .starts_at
        .checked_add_signed(chrono::Duration::minutes(service.duration_minutes as i64))
        .ok_or_else(|| ApiError::Validation("Date is out of range".into()))?;
    let slot = FlowSlot {
        starts_at: body.starts_at,
        ends_at,
    };

    flow.pick_slot(slot)?;

    // The chosen time must exist on the current grid and still be free.
    let grid = AvailabilityService::slots_for_date(
        &state.db,
        owner.id,
        service.duration_minutes,
        slot.starts_at.date(),
    )
    .await?;
    match grid.iter().find(|s| s.starts_at == slot.starts_at) {
        Some(s) if s.is_available => {}
        Some(_) => return Err(ApiError::Conflict("This time slot is no longer available".into())),
        None => return Err(ApiError::Conflict("This time slot is not available".into())),
    }

    FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await?;
    Ok(Json(flow))
}

pub async fn continue_to_details(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
) -> Result<Json<BookingFlow>, ApiError> {
    let mut redis = state.redis.clone();
    let mut flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;

    flow.proceed_to_details()?;
    FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await?;
    Ok(Json(flow))
}

pub async fn back(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
) -> Result<Json<BookingFlow>, ApiError> {
    let mut redis = state.redis.clone();
    let mut flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;

    flow.back()?;
    FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await?;
    Ok(Json(flow))
}

pub async fn restart(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
) -> Result<Json<BookingFlow>, ApiError> {
    let mut redis = state.redis.clone();
    let mut flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;

    flow.restart()?;
    FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await?;
    Ok(Json(flow))
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    pub client_name: String,
    pub client_phone: String,
}

#[derive(serde::Serialize)]
pub struct ConfirmResponse {
    pub flow: BookingFlow,
    pub appointment: Appointment,
}

pub async fn confirm(
    State(state): State<AppState>,
    ShopBySlug(owner): ShopBySlug,
    Path((_slug, id)): Path<(String, Uuid)>,
    headers: HeaderMap,
    Json(body): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let ip = real_ip(&headers);
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &format!("rate:booking:confirm:ip:{ip}"), 10, 3600).await?;

    let mut flow = FlowStore::load(&mut redis, &owner.shop_slug, id).await?;
    let (service, slot) = flow.confirmable()?;

    let result = AppointmentService::book(
        &state.db,
        owner.id,
        &service,
        &body.client_name,
        &body.client_phone,
        slot,
    )
    .await;

    let appointment = match result {
        Ok(a) => a,
        Err(e) => {
            if matches!(e, ApiError::Conflict(_)) {
                BOOKING_CONFLICTS_COUNTER
                    .with_label_values(&[&owner.shop_slug])
                    .inc();
            }
            return Err(e);
        }
    };

    flow.confirm(
        body.client_name.trim().to_string(),
        body.client_phone.trim().to_string(),
        appointment.id,
    )?;
    // The appointment row is the source of truth; if sealing the session
    // fails the booking still stands, so answer with it either way.
    if let Err(e) = FlowStore::save(
        &mut redis,
        &owner.shop_slug,
        &flow,
        state.config.booking_session_ttl_seconds,
    )
    .await
    {
        tracing::warn!("sealing booking session {} failed after booking: {e}", flow.id);
    }

    BOOKINGS_COUNTER.with_label_values(&[&owner.shop_slug]).inc();
    Ok(Json(ConfirmResponse { flow, appointment }))
}
