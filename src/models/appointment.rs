use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Allowed owner-driven transitions. Completed and cancelled are
    /// terminal; everything else is rejected.
    pub fn can_transition_to(self, next: AppointmentStatus) -> bool {
        matches!(
            (self, next),
            (AppointmentStatus::Scheduled, AppointmentStatus::Completed)
                | (AppointmentStatus::Scheduled, AppointmentStatus::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

/// Appointment times are shop-local wall clock (NaiveDateTime). The service
/// columns are a booking-time snapshot, so the row survives later catalog
/// edits and deletions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub service_id: Option<Uuid>,
    pub service_name: String,
    pub service_duration_minutes: i32,
    pub service_price_cents: i64,
    pub client_name: String,
    pub client_phone: String,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One bookable (or blocked) slot on the public availability grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub is_available: bool,
}

/// Query params for GET /appointments. Both bounds are inclusive dates and
/// both are optional; a bare request lists everything.
#[derive(Debug, Deserialize)]
pub struct AppointmentRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub appointments_today: i64,
    pub appointments_total: i64,
    pub services_total: i64,
    pub open_days: i64,
    pub today: Vec<Appointment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::Uri;

    #[test]
    fn test_range_query_bounds_are_optional() {
        let uri: Uri = "/appointments".parse().unwrap();
        let Query(q) = Query::<AppointmentRangeQuery>::try_from_uri(&uri).unwrap();
        assert!(q.from.is_none());
        assert!(q.to.is_none());

        let uri: Uri = "/appointments?from=2025-06-01".parse().unwrap();
        let Query(q) = Query::<AppointmentRangeQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.from, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert!(q.to.is_none());

        let uri: Uri = "/appointments?from=2025-06-01&to=2025-06-30".parse().unwrap();
        let Query(q) = Query::<AppointmentRangeQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.to, NaiveDate::from_ymd_opt(2025, 6, 30));
    }
}
