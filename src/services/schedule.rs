use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::schedule::{ReplaceWeekRequest, WorkingDay, WorkingDayInput};

pub struct ScheduleService;

impl ScheduleService {
    pub async fn list_week(pool: &PgPool, owner_id: Uuid) -> Result<Vec<WorkingDay>, ApiError> {
        let days = sqlx::query_as::<_, WorkingDay>(
            "SELECT * FROM working_hours WHERE owner_id = $1 ORDER BY day_of_week",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await?;
        Ok(days)
    }

    /// Replaces the whole week in one transaction, so a failure mid-way
    /// never leaves the shop with a half-written schedule.
    pub async fn replace_week(
        pool: &PgPool,
        owner_id: Uuid,
        req: &ReplaceWeekRequest,
    ) -> Result<Vec<WorkingDay>, ApiError> {
        validate_week(&req.days)?;

        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM working_hours WHERE owner_id = $1")
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        for day in &req.days {
            sqlx::query(
                "INSERT INTO working_hours (owner_id, day_of_week, is_open, opens_at, closes_at)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(owner_id)
            .bind(day.day_of_week)
            .bind(day.is_open)
            .bind(day.opens_at)
            .bind(day.closes_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Self::list_week(pool, owner_id).await
    }
}

/// The payload must cover the whole week: seven entries, each weekday
/// exactly once, and open days must have a non-empty window.
fn validate_week(days: &[WorkingDayInput]) -> Result<(), ApiError> {
    if days.len() != 7 {
        return Err(ApiError::Validation(format!(
            "Expected 7 days, got {}",
            days.len()
        )));
    }

    let mut seen = [false; 7];
    for day in days {
        if !(0..7).contains(&day.day_of_week) {
            return Err(ApiError::Validation(format!(
                "Invalid day_of_week {} (expected 0-6)",
                day.day_of_week
            )));
        }
        if seen[day.day_of_week as usize] {
            return Err(ApiError::Validation(format!(
                "Duplicate entry for day_of_week {}",
                day.day_of_week
            )));
        }
        seen[day.day_of_week as usize] = true;

        if day.is_open && day.opens_at >= day.closes_at {
            return Err(ApiError::Validation(format!(
                "Opening time must precede closing time on day {}",
                day.day_of_week
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn full_week() -> Vec<WorkingDayInput> {
        (0..7)
            .map(|d| WorkingDayInput {
                day_of_week: d,
                is_open: d != 0,
                opens_at: t(9),
                closes_at: t(18),
            })
            .collect()
    }

    #[test]
    fn test_full_week_passes() {
        assert!(validate_week(&full_week()).is_ok());
    }

    #[test]
    fn test_wrong_day_count_rejected() {
        let mut days = full_week();
        days.pop();
        assert!(matches!(validate_week(&days), Err(ApiError::Validation(_))));
        days.push(days[0].clone());
        days.push(days[1].clone());
        assert!(matches!(validate_week(&days), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_duplicate_day_rejected() {
        let mut days = full_week();
        days[6].day_of_week = 3;
        assert!(matches!(validate_week(&days), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_out_of_range_day_rejected() {
        let mut days = full_week();
        days[6].day_of_week = 7;
        assert!(matches!(validate_week(&days), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_open_day_with_empty_window_rejected() {
        let mut days = full_week();
        days[1].closes_at = t(9);
        assert!(matches!(validate_week(&days), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_closed_day_window_not_checked() {
        let mut days = full_week();
        days[0].is_open = false;
        days[0].opens_at = t(18);
        days[0].closes_at = t(9);
        assert!(validate_week(&days).is_ok());
    }
}
