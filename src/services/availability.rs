use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::appointment::TimeSlot;
use crate::models::schedule::{WeekSchedule, WorkingDay};
use crate::services::scheduling::{day_bounds, generate_slots};

pub struct AvailabilityService;

impl AvailabilityService {
    /// The slot grid for one shop, date and service duration. Days without a
    /// stored row resolve to closed; non-cancelled appointments anywhere in
    /// the day count as busy.
    pub async fn slots_for_date(
        pool: &PgPool,
        owner_id: Uuid,
        duration_minutes: i32,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, ApiError> {
        let rows: Vec<WorkingDay> =
            sqlx::query_as("SELECT * FROM working_hours WHERE owner_id = $1")
                .bind(owner_id)
                .fetch_all(pool)
                .await?;
        let hours = WeekSchedule::from_rows(&rows).hours_for_date(date);

        let busy = Self::busy_intervals(pool, owner_id, date).await?;
        Ok(generate_slots(date, hours, duration_minutes, &busy))
    }

    async fn busy_intervals(
        pool: &PgPool,
        owner_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<(NaiveDateTime, NaiveDateTime)>, ApiError> {
        let (day_start, day_end) =
            day_bounds(date).ok_or_else(|| ApiError::Validation("Date is out of range".into()))?;

        let intervals: Vec<(NaiveDateTime, NaiveDateTime)> = sqlx::query_as(
            "SELECT starts_at, ends_at FROM appointments
             WHERE owner_id = $1 AND status <> 'cancelled'
               AND starts_at < $2 AND ends_at > $3",
        )
        .bind(owner_id)
        .bind(day_end)
        .bind(day_start)
        .fetch_all(pool)
        .await?;
        Ok(intervals)
    }
}
