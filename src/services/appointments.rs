use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::appointment::{Appointment, AppointmentStatus, DashboardSummary};
use crate::services::booking_flow::{FlowService, FlowSlot};
use crate::services::scheduling::{day_bounds, on_slot_grid};

pub struct AppointmentService;

impl AppointmentService {
    /// Appointments ordered by start time. Each bound, when given, filters
    /// on the start's date, inclusive.
    pub async fn list_range(
        pool: &PgPool,
        owner_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, ApiError> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ApiError::Validation("'from' must not be after 'to'".into()));
            }
        }
        let range_start = from.map(|d| d.and_time(NaiveTime::MIN));
        let range_end = to
            .map(|d| {
                day_bounds(d)
                    .map(|(_, end)| end)
                    .ok_or_else(|| ApiError::Validation("'to' is out of range".into()))
            })
            .transpose()?;

        let appointments = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments
             WHERE owner_id = $1
               AND ($2::timestamp IS NULL OR starts_at >= $2)
               AND ($3::timestamp IS NULL OR starts_at < $3)
             ORDER BY starts_at",
        )
        .bind(owner_id)
        .bind(range_start)
        .bind(range_end)
        .fetch_all(pool)
        .await?;
        Ok(appointments)
    }

    /// Applies an owner-driven status change, enforcing the transition
    /// table. Rejections name both states so the client can explain. The
    /// UPDATE re-asserts the status the check saw; a racing request that
    /// got there first turns this one into a conflict instead of stacking
    /// a second transition onto a terminal state.
    pub async fn update_status(
        pool: &PgPool,
        owner_id: Uuid,
        id: Uuid,
        next: AppointmentStatus,
    ) -> Result<Appointment, ApiError> {
        let current: Appointment =
            sqlx::query_as("SELECT * FROM appointments WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;

        if !current.status.can_transition_to(next) {
            return Err(ApiError::Conflict(format!(
                "Cannot change status from {} to {}",
                current.status.as_str(),
                next.as_str()
            )));
        }

        sqlx::query_as::<_, Appointment>(
            "UPDATE appointments SET status = $1
             WHERE id = $2 AND owner_id = $3 AND status = $4
             RETURNING *",
        )
        .bind(next)
        .bind(id)
        .bind(owner_id)
        .bind(current.status)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Appointment changed in the meantime, reload and retry".into())
        })
    }

    /// Books the slot inside one transaction: the service, the working-hours
    /// window, grid alignment and the overlap check are re-run against
    /// current data, and the exclusion constraint settles whoever confirms
    /// first when two sessions race.
    pub async fn book(
        pool: &PgPool,
        owner_id: Uuid,
        service: &FlowService,
        client_name: &str,
        client_phone: &str,
        slot: FlowSlot,
    ) -> Result<Appointment, ApiError> {
        validate_contact(client_name, client_phone)?;

        use chrono::Datelike;
        let date = slot.starts_at.date();
        let day_of_week = date.weekday().num_days_from_sunday() as i16;

        let mut tx = pool.begin().await?;

        let service_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM services WHERE id = $1 AND owner_id = $2)",
        )
        .bind(service.id)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;
        if !service_exists {
            return Err(ApiError::Conflict("This service is no longer offered".into()));
        }

        let window: Option<(NaiveTime, NaiveTime)> = sqlx::query_as(
            "SELECT opens_at, closes_at FROM working_hours
             WHERE owner_id = $1 AND day_of_week = $2 AND is_open",
        )
        .bind(owner_id)
        .bind(day_of_week)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((opens_at, closes_at)) = window else {
            return Err(ApiError::Conflict(
                "The shop is not open at the selected time".into(),
            ));
        };
        if slot.ends_at.date() != date
            || slot.starts_at.time() < opens_at
            || slot.ends_at.time() > closes_at
        {
            return Err(ApiError::Conflict(
                "The shop is not open at the selected time".into(),
            ));
        }
        // Hours may have shifted since the slot was picked, leaving it
        // inside the window but off the grid the clients are shown.
        if !on_slot_grid(date.and_time(opens_at), slot.starts_at) {
            return Err(ApiError::Conflict("This time slot is no longer available".into()));
        }

        let overlaps: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                 SELECT 1 FROM appointments
                 WHERE owner_id = $1 AND status <> 'cancelled'
                   AND starts_at < $2 AND ends_at > $3
             )",
        )
        .bind(owner_id)
        .bind(slot.ends_at)
        .bind(slot.starts_at)
        .fetch_one(&mut *tx)
        .await?;
        if overlaps {
            return Err(ApiError::Conflict("This time slot is no longer available".into()));
        }

        let result = sqlx::query_as::<_, Appointment>(
            "INSERT INTO appointments
                 (owner_id, service_id, service_name, service_duration_minutes,
                  service_price_cents, client_name, client_phone, starts_at, ends_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(owner_id)
        .bind(service.id)
        .bind(&service.name)
        .bind(service.duration_minutes)
        .bind(service.price_cents)
        .bind(client_name.trim())
        .bind(client_phone.trim())
        .bind(slot.starts_at)
        .bind(slot.ends_at)
        .fetch_one(&mut *tx)
        .await;

        let appointment = match result {
            Ok(a) => a,
            Err(e) if e.to_string().contains("appointments_no_overlap") => {
                return Err(ApiError::Conflict("This time slot is no longer available".into()));
            }
            // Service deleted between our existence check and the insert.
            Err(e) if e.to_string().contains("appointments_service_id_fkey") => {
                return Err(ApiError::Conflict("This service is no longer offered".into()));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        Ok(appointment)
    }

    pub async fn dashboard_summary(
        pool: &PgPool,
        owner_id: Uuid,
        today: NaiveDate,
    ) -> Result<DashboardSummary, ApiError> {
        let (day_start, day_end) = day_bounds(today)
            .ok_or_else(|| ApiError::Validation("Date is out of range".into()))?;

        let (appointments_today, appointments_total): (i64, i64) = sqlx::query_as(
            "SELECT
                 COUNT(*) FILTER (WHERE starts_at >= $2 AND starts_at < $3
                                    AND status <> 'cancelled'),
                 COUNT(*)
             FROM appointments WHERE owner_id = $1",
        )
        .bind(owner_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_one(pool)
        .await?;

        let services_total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM services WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_one(pool)
                .await?;

        let open_days: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM working_hours WHERE owner_id = $1 AND is_open",
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await?;

        let today_list = sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments
             WHERE owner_id = $1 AND starts_at >= $2 AND starts_at < $3
             ORDER BY starts_at",
        )
        .bind(owner_id)
        .bind(day_start)
        .bind(day_end)
        .fetch_all(pool)
        .await?;

        Ok(DashboardSummary {
            appointments_today,
            appointments_total,
            services_total,
            open_days,
            today: today_list,
        })
    }
}

/// The shop's current date. Appointment times are shop-local wall clock, so
/// "today" is the UTC instant shifted by the shop's configured offset.
pub fn local_today(now: DateTime<Utc>, utc_offset_minutes: i32) -> NaiveDate {
    (now + chrono::Duration::minutes(utc_offset_minutes as i64)).date_naive()
}

/// Booking contact rules: a non-empty name and a phone number with 7 to 15
/// digits once separators are stripped.
pub fn validate_contact(name: &str, phone: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::Validation("Client name is required".into()));
    }
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let stripped_ok = phone
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_whitespace() || "+-().".contains(c));
    if !stripped_ok || !(7..=15).contains(&digits.len()) {
        return Err(ApiError::Validation("A valid phone number is required".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_accepts_common_phone_formats() {
        assert!(validate_contact("Ana Souza", "11988887777").is_ok());
        assert!(validate_contact("Ana", "+55 (11) 98888-7777").is_ok());
        assert!(validate_contact("Ana", "555-0199").is_ok());
    }

    #[test]
    fn test_contact_rejects_blank_name() {
        assert!(matches!(
            validate_contact("   ", "11988887777"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_contact_rejects_bad_phone_lengths() {
        assert!(validate_contact("Ana", "123456").is_err());
        assert!(validate_contact("Ana", "1234567890123456").is_err());
        assert!(validate_contact("Ana", "").is_err());
    }

    #[test]
    fn test_contact_rejects_letters_in_phone() {
        assert!(validate_contact("Ana", "call-me-maybe").is_err());
    }

    #[test]
    fn test_status_transition_table() {
        use AppointmentStatus::*;
        assert!(Scheduled.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(!Scheduled.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(!Cancelled.can_transition_to(Completed));
    }

    #[test]
    fn test_local_today_follows_the_shop_offset() {
        use chrono::TimeZone;
        let just_past_midnight_utc = Utc.with_ymd_and_hms(2025, 6, 2, 1, 30, 0).unwrap();
        assert_eq!(
            local_today(just_past_midnight_utc, 0),
            NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
        );
        // UTC-3: the shop is still on the previous evening.
        assert_eq!(
            local_today(just_past_midnight_utc, -180),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
        );
        let late_evening_utc = Utc.with_ymd_and_hms(2025, 6, 2, 23, 30, 0).unwrap();
        assert_eq!(
            local_today(late_evening_utc, 120),
            NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
        );
    }
}
