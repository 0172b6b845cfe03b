use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::appointment::TimeSlot;
use crate::models::schedule::DayHours;

/// Grid step between slot starts, independent of service duration.
pub const SLOT_STRIDE_MINUTES: i64 = 30;

/// True when `starts_at` sits on the slot grid anchored at the day's
/// opening time.
pub fn on_slot_grid(day_opens: NaiveDateTime, starts_at: NaiveDateTime) -> bool {
    let offset = (starts_at - day_opens).num_seconds();
    offset >= 0 && offset % (SLOT_STRIDE_MINUTES * 60) == 0
}

/// Start of `date` and start of the next day, or None when the next day
/// cannot be represented.
pub fn day_bounds(date: NaiveDate) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = date.and_time(NaiveTime::MIN);
    let end = date.succ_opt()?.and_time(NaiveTime::MIN);
    Some((start, end))
}

/// Generates the availability grid for one date.
///
/// Slot starts advance on a fixed 30-minute grid from opening time. A slot
/// is emitted while it still fits inside the day (it may end exactly at
/// closing time). Slots that overlap a busy interval are kept but marked
/// unavailable, so the caller sees the full grid.
///
/// `busy` holds half-open `[start, end)` intervals; an appointment ending at
/// 10:00 does not block a slot starting at 10:00.
pub fn generate_slots(
    date: NaiveDate,
    hours: DayHours,
    duration_minutes: i32,
    busy: &[(NaiveDateTime, NaiveDateTime)],
) -> Vec<TimeSlot> {
    if !hours.is_open || duration_minutes <= 0 {
        return Vec::new();
    }

    let duration = Duration::minutes(duration_minutes as i64);
    let stride = Duration::minutes(SLOT_STRIDE_MINUTES);
    let window_end = date.and_time(hours.closes_at);

    let mut slots = Vec::new();
    let mut cursor = date.and_time(hours.opens_at);
    while cursor + duration <= window_end {
        let ends_at = cursor + duration;
        slots.push(TimeSlot {
            starts_at: cursor,
            ends_at,
            is_available: !busy.iter().any(|&(bs, be)| cursor < be && bs < ends_at),
        });
        cursor += stride;
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::{WeekSchedule, WorkingDay};
    use chrono::{NaiveTime, Utc};
    use uuid::Uuid;

    fn open(from: (u32, u32), to: (u32, u32)) -> DayHours {
        DayHours {
            is_open: true,
            opens_at: NaiveTime::from_hms_opt(from.0, from.1, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(to.0, to.1, 0).unwrap(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap() // a Monday
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        date().and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[test]
    fn test_standard_day_thirty_minute_service() {
        let slots = generate_slots(date(), open((9, 0), (18, 0)), 30, &[]);
        assert_eq!(slots.len(), 18);
        assert_eq!(slots[0].starts_at, at(9, 0));
        assert_eq!(slots[0].ends_at, at(9, 30));
        // Last slot ends exactly at closing time.
        assert_eq!(slots[17].starts_at, at(17, 30));
        assert_eq!(slots[17].ends_at, at(18, 0));
        assert!(slots.iter().all(|s| s.is_available));
    }

    #[test]
    fn test_longer_service_still_strides_every_thirty_minutes() {
        let slots = generate_slots(date(), open((9, 0), (18, 0)), 60, &[]);
        // Starts 09:00, 09:30, ... 17:00.
        assert_eq!(slots.len(), 17);
        assert_eq!(slots[1].starts_at, at(9, 30));
        assert_eq!(slots[16].starts_at, at(17, 0));
        assert_eq!(slots[16].ends_at, at(18, 0));
    }

    #[test]
    fn test_overlapping_slots_marked_unavailable_not_dropped() {
        let busy = vec![(at(10, 0), at(11, 0))];
        let slots = generate_slots(date(), open((9, 0), (18, 0)), 30, &busy);
        assert_eq!(slots.len(), 18);
        let by_start = |h, m| slots.iter().find(|s| s.starts_at == at(h, m)).unwrap();
        assert!(by_start(9, 30).is_available); // ends 10:00, touching is fine
        assert!(!by_start(10, 0).is_available);
        assert!(!by_start(10, 30).is_available);
        assert!(by_start(11, 0).is_available); // starts when the busy block ends
    }

    #[test]
    fn test_long_service_conflicts_with_later_busy_block() {
        let busy = vec![(at(10, 0), at(10, 30))];
        let slots = generate_slots(date(), open((9, 0), (18, 0)), 60, &busy);
        let by_start = |h, m| slots.iter().find(|s| s.starts_at == at(h, m)).unwrap();
        // A 60-minute slot starting 09:30 runs until 10:30 and collides.
        assert!(by_start(9, 0).is_available);
        assert!(!by_start(9, 30).is_available);
        assert!(!by_start(10, 0).is_available);
        assert!(by_start(10, 30).is_available);
    }

    #[test]
    fn test_closed_day_yields_no_slots() {
        let slots = generate_slots(date(), DayHours::closed(), 30, &[]);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_degenerate_window_yields_no_slots() {
        // opens == closes
        let slots = generate_slots(date(), open((9, 0), (9, 0)), 30, &[]);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_service_longer_than_window_yields_no_slots() {
        let slots = generate_slots(date(), open((9, 0), (10, 0)), 90, &[]);
        assert!(slots.is_empty());
    }

    #[test]
    fn test_nonpositive_duration_yields_no_slots() {
        assert!(generate_slots(date(), open((9, 0), (18, 0)), 0, &[]).is_empty());
        assert!(generate_slots(date(), open((9, 0), (18, 0)), -15, &[]).is_empty());
    }

    #[test]
    fn test_short_window_keeps_slot_ending_at_close() {
        // 09:00-09:45 with a 45-minute service: exactly one slot.
        let slots = generate_slots(date(), open((9, 0), (9, 45)), 45, &[]);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].ends_at, at(9, 45));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let busy = vec![(at(10, 0), at(11, 0)), (at(15, 30), at(16, 0))];
        let first = generate_slots(date(), open((9, 0), (18, 0)), 30, &busy);
        let second = generate_slots(date(), open((9, 0), (18, 0)), 30, &busy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_slot_grid_is_anchored_at_opening_time() {
        assert!(on_slot_grid(at(9, 0), at(9, 0)));
        assert!(on_slot_grid(at(9, 0), at(10, 30)));
        assert!(!on_slot_grid(at(9, 0), at(9, 15)));
        assert!(!on_slot_grid(at(9, 0), at(8, 30))); // before opening

        // Opening at 09:15 moves the whole grid with it.
        assert!(on_slot_grid(at(9, 15), at(9, 45)));
        assert!(!on_slot_grid(at(9, 15), at(10, 0)));

        let odd = date().and_time(NaiveTime::from_hms_opt(9, 30, 30).unwrap());
        assert!(!on_slot_grid(at(9, 0), odd));
    }

    #[test]
    fn test_day_bounds_cover_exactly_one_day() {
        let (start, end) = day_bounds(date()).unwrap();
        assert_eq!(start, at(0, 0));
        assert_eq!(end - start, Duration::days(1));
    }

    #[test]
    fn test_day_bounds_reject_the_last_representable_date() {
        assert!(day_bounds(NaiveDate::MAX).is_none());
    }

    fn row(day_of_week: i16, is_open: bool) -> WorkingDay {
        WorkingDay {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            day_of_week,
            is_open,
            opens_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            closes_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_week_schedule_defaults_missing_days_to_closed() {
        // Only Monday stored.
        let week = WeekSchedule::from_rows(&[row(1, true)]);
        assert!(week.hours_for_weekday(1).is_open);
        assert!(!week.hours_for_weekday(0).is_open);
        assert!(!week.hours_for_weekday(6).is_open);
    }

    #[test]
    fn test_week_schedule_maps_dates_with_sunday_as_zero() {
        let week = WeekSchedule::from_rows(&[row(0, true), row(1, false)]);
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert!(week.hours_for_date(sunday).is_open);
        assert!(!week.hours_for_date(monday).is_open);
    }

    #[test]
    fn test_week_schedule_ignores_out_of_range_rows() {
        let week = WeekSchedule::from_rows(&[row(7, true), row(-1, true)]);
        for d in 0..7 {
            assert!(!week.hours_for_weekday(d).is_open);
        }
    }
}
