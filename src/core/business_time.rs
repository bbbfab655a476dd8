//! Business-hours-aware response time.
//!
//! Walks a cursor from lead creation toward first contact and only counts
//! time spent inside the calendar's working windows. Weekends and
//! out-of-window periods are skipped without accruing anything.

use crate::domain::calendar::{AfterHoursRollover, BusinessCalendar};
use crate::domain::model::{BusinessDuration, TimeInterval};
use chrono::{Datelike, NaiveDateTime, TimeDelta};

/// Elapsed business time between two timestamps.
///
/// Returns `None` when either timestamp is missing and
/// [`BusinessDuration::ZERO`] when `created_at >= contacted_at`.
/// `hours` is a running total over the whole walk and `days` counts the
/// windows traversed to their end, so `hours` is not bounded by the window
/// length.
pub fn business_duration(
    created_at: Option<NaiveDateTime>,
    contacted_at: Option<NaiveDateTime>,
    calendar: &BusinessCalendar,
) -> Option<BusinessDuration> {
    Some(walk(created_at?, contacted_at?, calendar))
}

impl TimeInterval {
    pub fn business_duration(&self, calendar: &BusinessCalendar) -> Option<BusinessDuration> {
        business_duration(self.created_at, self.contacted_at, calendar)
    }
}

fn walk(
    created_at: NaiveDateTime,
    contacted_at: NaiveDateTime,
    calendar: &BusinessCalendar,
) -> BusinessDuration {
    if created_at >= contacted_at {
        return BusinessDuration::ZERO;
    }

    let mut cursor = created_at;
    let mut accrued = TimeDelta::zero();
    let mut days = 0u32;

    while cursor < contacted_at {
        if !calendar.is_working_day(cursor.weekday()) {
            let Some(next) = skip_day(cursor, calendar) else {
                break;
            };
            cursor = next;
            continue;
        }

        let date = cursor.date();
        let window_start = date.and_time(calendar.day_start());
        let window_end = date.and_time(calendar.day_end());

        if cursor < window_start {
            cursor = window_start;
            // contact happened before the window opened
            if cursor >= contacted_at {
                break;
            }
        }

        if cursor >= window_end {
            let Some(next) = skip_day(cursor, calendar) else {
                break;
            };
            cursor = next;
            continue;
        }

        if contacted_at < window_end {
            accrued += contacted_at - cursor;
            break;
        }

        accrued += window_end - cursor;
        days += 1;
        let Some(next_day) = date.succ_opt() else {
            break;
        };
        cursor = next_day.and_time(calendar.day_start());
    }

    BusinessDuration {
        hours: as_hours(accrued),
        days,
    }
}

/// Moves the cursor to the next calendar day without accruing anything.
/// `None` only at the end of the representable calendar.
fn skip_day(cursor: NaiveDateTime, calendar: &BusinessCalendar) -> Option<NaiveDateTime> {
    match calendar.after_hours() {
        AfterHoursRollover::KeepTimeOfDay => cursor.checked_add_signed(TimeDelta::days(1)),
        AfterHoursRollover::NextDayStart => cursor
            .date()
            .succ_opt()
            .map(|next_day| next_day.and_time(calendar.day_start())),
    }
}

fn as_hours(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 3_600_000_000.0,
        None => delta.num_seconds() as f64 / 3_600.0,
    }
}
