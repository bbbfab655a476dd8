use crate::utils::error::{AnalyticsError, Result};
use chrono::{NaiveTime, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DEFAULT_DAY_START: NaiveTime = match NaiveTime::from_hms_opt(9, 0, 0) {
    Some(t) => t,
    None => panic!("invalid default day start"),
};

const DEFAULT_DAY_END: NaiveTime = match NaiveTime::from_hms_opt(15, 0, 0) {
    Some(t) => t,
    None => panic!("invalid default day end"),
};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Where the cursor lands when it skips a day without accruing time: on a
/// non-working day, or at or past the end of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterHoursRollover {
    /// Same time of day on the next calendar day.
    #[default]
    KeepTimeOfDay,
    /// Start of the window on the next calendar day.
    NextDayStart,
}

impl FromStr for AfterHoursRollover {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "keep_time_of_day" => Ok(Self::KeepTimeOfDay),
            "next_day_start" => Ok(Self::NextDayStart),
            other => Err(AnalyticsError::InvalidConfigValueError {
                field: "after_hours".to_string(),
                value: other.to_string(),
                reason: "Expected keep_time_of_day or next_day_start".to_string(),
            }),
        }
    }
}

impl fmt::Display for AfterHoursRollover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepTimeOfDay => write!(f, "keep_time_of_day"),
            Self::NextDayStart => write!(f, "next_day_start"),
        }
    }
}

/// Working weekdays plus the daily `[day_start, day_end)` window in which
/// elapsed time counts toward business response time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    // bit i set <=> weekday with num_days_from_monday() == i is a working day
    working_days: u8,
    day_start: NaiveTime,
    day_end: NaiveTime,
    after_hours: AfterHoursRollover,
}

impl BusinessCalendar {
    pub fn new<I>(working_days: I, day_start: NaiveTime, day_end: NaiveTime) -> Result<Self>
    where
        I: IntoIterator<Item = Weekday>,
    {
        let mask = working_days
            .into_iter()
            .fold(0u8, |mask, day| mask | (1 << day.num_days_from_monday()));

        if mask == 0 {
            return Err(AnalyticsError::InvalidCalendarConfig {
                reason: "at least one working day is required".to_string(),
            });
        }

        if day_start >= day_end {
            return Err(AnalyticsError::InvalidCalendarConfig {
                reason: format!(
                    "day_start ({}) must be before day_end ({})",
                    day_start.format("%H:%M"),
                    day_end.format("%H:%M")
                ),
            });
        }

        Ok(Self {
            working_days: mask,
            day_start,
            day_end,
            after_hours: AfterHoursRollover::default(),
        })
    }

    pub fn with_after_hours(mut self, after_hours: AfterHoursRollover) -> Self {
        self.after_hours = after_hours;
        self
    }

    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.working_days & (1 << day.num_days_from_monday()) != 0
    }

    pub fn working_days(&self) -> Vec<Weekday> {
        WEEK.into_iter()
            .filter(|day| self.is_working_day(*day))
            .collect()
    }

    pub fn day_start(&self) -> NaiveTime {
        self.day_start
    }

    pub fn day_end(&self) -> NaiveTime {
        self.day_end
    }

    pub fn after_hours(&self) -> AfterHoursRollover {
        self.after_hours
    }

    pub fn window_length(&self) -> TimeDelta {
        self.day_end - self.day_start
    }
}

impl Default for BusinessCalendar {
    /// Monday to Friday, 09:00 to 15:00.
    fn default() -> Self {
        Self {
            working_days: 0b001_1111,
            day_start: DEFAULT_DAY_START,
            day_end: DEFAULT_DAY_END,
            after_hours: AfterHoursRollover::KeepTimeOfDay,
        }
    }
}

impl fmt::Display for BusinessCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days: Vec<String> = self
            .working_days()
            .iter()
            .map(|day| day.to_string())
            .collect();
        write!(
            f,
            "{} {}-{} (after hours: {})",
            days.join(","),
            self.day_start.format("%H:%M"),
            self.day_end.format("%H:%M"),
            self.after_hours
        )
    }
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|e| AnalyticsError::InvalidConfigValueError {
            field: "time_of_day".to_string(),
            value: value.to_string(),
            reason: format!("Expected HH:MM or HH:MM:SS ({})", e),
        })
}

/// Accepts short or long English names, case-insensitive ("Mon", "monday").
pub fn parse_weekday(value: &str) -> Result<Weekday> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| AnalyticsError::InvalidConfigValueError {
            field: "working_days".to_string(),
            value: value.to_string(),
            reason: "Expected a weekday name such as Mon or Monday".to_string(),
        })
}

pub fn parse_working_days<S: AsRef<str>>(values: &[S]) -> Result<Vec<Weekday>> {
    values.iter().map(|v| parse_weekday(v.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_default_calendar() {
        let calendar = BusinessCalendar::default();
        assert_eq!(
            calendar.working_days(),
            vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri
            ]
        );
        assert_eq!(calendar.day_start(), hm(9, 0));
        assert_eq!(calendar.day_end(), hm(15, 0));
        assert_eq!(calendar.window_length(), TimeDelta::hours(6));
        assert!(!calendar.is_working_day(Weekday::Sat));
        assert_eq!(calendar.after_hours(), AfterHoursRollover::KeepTimeOfDay);
    }

    #[test]
    fn test_default_matches_explicit_construction() {
        let explicit = BusinessCalendar::new(
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            hm(9, 0),
            hm(15, 0),
        )
        .unwrap();
        assert_eq!(explicit, BusinessCalendar::default());
    }

    #[test]
    fn test_rejects_empty_working_days() {
        let result = BusinessCalendar::new(Vec::new(), hm(9, 0), hm(15, 0));
        assert!(matches!(
            result,
            Err(AnalyticsError::InvalidCalendarConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_inverted_or_empty_window() {
        assert!(matches!(
            BusinessCalendar::new([Weekday::Mon], hm(15, 0), hm(9, 0)),
            Err(AnalyticsError::InvalidCalendarConfig { .. })
        ));
        assert!(matches!(
            BusinessCalendar::new([Weekday::Mon], hm(9, 0), hm(9, 0)),
            Err(AnalyticsError::InvalidCalendarConfig { .. })
        ));
    }

    #[test]
    fn test_duplicate_days_collapse() {
        let calendar =
            BusinessCalendar::new([Weekday::Sun, Weekday::Sun, Weekday::Sat], hm(8, 0), hm(12, 0))
                .unwrap();
        assert_eq!(calendar.working_days(), vec![Weekday::Sat, Weekday::Sun]);
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_time_of_day("09:30").unwrap(), hm(9, 30));
        assert_eq!(parse_time_of_day(" 15:00:00 ").unwrap(), hm(15, 0));
        assert!(parse_time_of_day("3pm").is_err());

        assert_eq!(parse_weekday("monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("Fri").unwrap(), Weekday::Fri);
        assert!(parse_weekday("someday").is_err());

        let days = parse_working_days(&["Sun", "Mon", "Tue", "Wed", "Thu"]).unwrap();
        assert_eq!(days.len(), 5);
    }

    #[test]
    fn test_after_hours_from_str() {
        assert_eq!(
            "next-day-start".parse::<AfterHoursRollover>().unwrap(),
            AfterHoursRollover::NextDayStart
        );
        assert_eq!(
            "keep_time_of_day".parse::<AfterHoursRollover>().unwrap(),
            AfterHoursRollover::KeepTimeOfDay
        );
        assert!("tomorrow".parse::<AfterHoursRollover>().is_err());
    }

    #[test]
    fn test_display() {
        let calendar = BusinessCalendar::default();
        assert_eq!(
            calendar.to_string(),
            "Mon,Tue,Wed,Thu,Fri 09:00-15:00 (after hours: keep_time_of_day)"
        );
    }
}
