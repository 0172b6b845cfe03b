use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One stored weekday row. day_of_week: 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkingDay {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub day_of_week: i16,
    pub is_open: bool,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Opening hours for a single weekday, independent of storage. Days with no
/// stored row are treated as closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayHours {
    pub is_open: bool,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

impl DayHours {
    pub fn closed() -> Self {
        Self {
            is_open: false,
            opens_at: NaiveTime::MIN,
            closes_at: NaiveTime::MIN,
        }
    }
}

/// The full week as seen by slot generation: every weekday resolves to
/// concrete hours, stored or not.
#[derive(Debug, Clone)]
pub struct WeekSchedule {
    days: [DayHours; 7],
}

impl WeekSchedule {
    pub fn from_rows(rows: &[WorkingDay]) -> Self {
        let mut days = [DayHours::closed(); 7];
        for row in rows {
            if (0..7).contains(&row.day_of_week) {
                days[row.day_of_week as usize] = DayHours {
                    is_open: row.is_open,
                    opens_at: row.opens_at,
                    closes_at: row.closes_at,
                };
            }
        }
        Self { days }
    }

    pub fn hours_for_weekday(&self, day_of_week: i16) -> DayHours {
        if (0..7).contains(&day_of_week) {
            self.days[day_of_week as usize]
        } else {
            DayHours::closed()
        }
    }

    pub fn hours_for_date(&self, date: NaiveDate) -> DayHours {
        use chrono::Datelike;
        self.hours_for_weekday(date.weekday().num_days_from_sunday() as i16)
    }
}

/// Body for PUT /working-hours: the whole week at once, one entry per
/// weekday.
#[derive(Debug, Deserialize)]
pub struct ReplaceWeekRequest {
    pub days: Vec<WorkingDayInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkingDayInput {
    pub day_of_week: i16,
    pub is_open: bool,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}
