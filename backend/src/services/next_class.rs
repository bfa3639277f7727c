//! Next-class resolution.
//!
//! Pure function from a weekly schedule and the current instant to the class
//! the student should walk to next.
//!
//! Two conventions matter:
//!
//! - **Weekday mapping**: `day_index = weekday_from_sunday - 1`, so schedule
//!   slot 0 is Monday and Sunday maps to `-1`, which always reads as an empty
//!   day. Slot 6 is never consulted.
//! - **Clock offset**: the current time-of-day (hours and minutes) is shifted
//!   by a fixed number of minutes (360 by default) before comparing with class
//!   start times. The shifted value is not wrapped at midnight.
//!
//! Entries are scanned in stored order and the *first* entry starting after
//! the shifted time wins, which is not necessarily the earliest upcoming one.

use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, TimeZone, Timelike};

use crate::api::{ClassEntry, NextClass, WeeklySchedule};
use crate::config::ResolverSettings;
use crate::error::ScheduleDataError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Tunable parts of the resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    /// Minutes added to the current time-of-day before comparison.
    pub clock_offset_minutes: i64,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            clock_offset_minutes: 360,
        }
    }
}

impl From<&ResolverSettings> for ResolverPolicy {
    fn from(settings: &ResolverSettings) -> Self {
        Self {
            clock_offset_minutes: settings.clock_offset_minutes,
        }
    }
}

/// Schedule day-slot for an instant (Monday = 0, Sunday = -1).
pub fn schedule_day_index<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    i64::from(now.weekday().num_days_from_sunday()) - 1
}

/// Minutes since midnight, ignoring seconds.
pub fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour()) * 60 + i64::from(time.minute())
}

/// Parse a class start timestamp and return its time-of-day in `zone`.
///
/// Timestamps with an explicit offset are converted into `zone`; timestamps
/// without one are taken as wall-clock time already. The date part is ignored.
pub fn parse_start_time<Tz: TimeZone>(value: &str, zone: &Tz) -> Option<NaiveTime> {
    let value = value.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Some(with_offset.with_timezone(zone).time());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.time())
}

fn start_minutes<Tz: TimeZone>(entry: &ClassEntry, zone: &Tz) -> Result<i64, ScheduleDataError> {
    parse_start_time(entry.start_time(), zone)
        .map(minutes_of_day)
        .ok_or_else(|| ScheduleDataError::InvalidStartTime {
            course_number: entry.course_number.clone(),
            value: entry.start_time().to_string(),
        })
}

/// Resolve the next class.
///
/// # Returns
/// * `Ok(None)` - schedule not loaded yet, or no class left today
/// * `Ok(Some(NextClass::NoClassesToday))` - today's day-slot is empty
/// * `Ok(Some(NextClass::Class(entry)))` - the next class
/// * `Err(ScheduleDataError)` - an entry of today's slot has an unparsable start time
pub fn resolve_next_class<Tz: TimeZone>(
    schedule: Option<&WeeklySchedule>,
    now: &DateTime<Tz>,
    policy: &ResolverPolicy,
) -> Result<Option<NextClass>, ScheduleDataError> {
    let Some(schedule) = schedule else {
        return Ok(None);
    };

    let today = schedule.day(schedule_day_index(now));
    if today.is_empty() {
        return Ok(Some(NextClass::NoClassesToday));
    }

    let zone = now.timezone();
    let starts = today
        .iter()
        .map(|entry| start_minutes(entry, &zone))
        .collect::<Result<Vec<_>, _>>()?;

    let current = minutes_of_day(now.time()) + policy.clock_offset_minutes;

    Ok(today
        .iter()
        .zip(starts)
        .find(|(_, start)| *start > current)
        .map(|(entry, _)| NextClass::Class(entry.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    // 2024-01-01 is a Monday.
    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, hour, minute, 0)
            .unwrap()
    }

    fn entry(course: &str, start: &str) -> ClassEntry {
        ClassEntry::new(course, "Bourns Hall", start)
    }

    fn schedule_with(day: usize, entries: Vec<ClassEntry>) -> WeeklySchedule {
        let mut schedule = WeeklySchedule::empty();
        *schedule.day_mut(day).unwrap() = entries;
        schedule
    }

    fn resolve(schedule: &WeeklySchedule, now: DateTime<FixedOffset>) -> Option<NextClass> {
        resolve_next_class(Some(schedule), &now, &ResolverPolicy::default()).unwrap()
    }

    fn course(next: Option<NextClass>) -> Option<String> {
        match next {
            Some(NextClass::Class(entry)) => Some(entry.course_number),
            _ => None,
        }
    }

    #[test]
    fn test_absent_schedule_is_unresolved() {
        let result = resolve_next_class(None, &at(1, 8, 0), &ResolverPolicy::default()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_weekday_mapping() {
        assert_eq!(schedule_day_index(&at(1, 12, 0)), 0); // Monday
        assert_eq!(schedule_day_index(&at(6, 12, 0)), 5); // Saturday
        assert_eq!(schedule_day_index(&at(7, 12, 0)), -1); // Sunday
    }

    #[test]
    fn test_empty_day_is_sentinel() {
        let schedule = schedule_with(1, vec![entry("CS 100", "2024-01-02T23:00:00")]);
        assert_eq!(resolve(&schedule, at(1, 0, 0)), Some(NextClass::NoClassesToday));
    }

    #[test]
    fn test_sunday_is_always_sentinel() {
        let schedule = schedule_with(6, vec![entry("CS 100", "2024-01-07T23:00:00")]);
        assert_eq!(resolve(&schedule, at(7, 0, 0)), Some(NextClass::NoClassesToday));
    }

    #[test]
    fn test_offset_boundary() {
        // 08:00 + 6h = 14:00 = 840 minutes
        let schedule = schedule_with(
            0,
            vec![
                entry("EARLY", "2024-01-01T13:59:00"),
                entry("EXACT", "2024-01-01T14:00:00"),
                entry("LATER", "2024-01-01T14:30:00"),
            ],
        );
        assert_eq!(course(resolve(&schedule, at(1, 8, 0))).as_deref(), Some("LATER"));
    }

    #[test]
    fn test_monday_early_morning() {
        // 02:30 + 6h = 08:30 < 09:00
        let schedule = schedule_with(0, vec![entry("MATH 9A", "2024-01-01T09:00:00")]);
        assert_eq!(
            course(resolve(&schedule, at(1, 2, 30))).as_deref(),
            Some("MATH 9A")
        );
    }

    #[test]
    fn test_no_more_classes_is_unresolved() {
        let schedule = schedule_with(0, vec![entry("CS 100", "2024-01-01T09:00:00")]);
        assert_eq!(resolve(&schedule, at(1, 3, 0)), None);
    }

    #[test]
    fn test_shifted_time_does_not_wrap() {
        // 19:00 + 6h = 1500 minutes, beyond any time-of-day
        let schedule = schedule_with(0, vec![entry("LATE", "2024-01-01T23:59:00")]);
        assert_eq!(resolve(&schedule, at(1, 19, 0)), None);
    }

    #[test]
    fn test_first_in_stored_order_wins() {
        let schedule = schedule_with(
            0,
            vec![
                entry("AFTERNOON", "2024-01-01T16:00:00"),
                entry("MIDDAY", "2024-01-01T15:00:00"),
            ],
        );
        assert_eq!(
            course(resolve(&schedule, at(1, 8, 0))).as_deref(),
            Some("AFTERNOON")
        );
    }

    #[test]
    fn test_date_component_is_ignored() {
        let schedule = schedule_with(0, vec![entry("OLD DATE", "1999-12-31T15:00:00")]);
        assert_eq!(
            course(resolve(&schedule, at(1, 8, 0))).as_deref(),
            Some("OLD DATE")
        );
    }

    #[test]
    fn test_unparsable_start_time_fails() {
        let schedule = schedule_with(
            0,
            vec![
                entry("GOOD", "2024-01-01T15:00:00"),
                entry("BAD", "half past nine"),
            ],
        );
        let err = resolve_next_class(Some(&schedule), &at(1, 8, 0), &ResolverPolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleDataError::InvalidStartTime {
                course_number: "BAD".to_string(),
                value: "half past nine".to_string(),
            }
        );
    }

    #[test]
    fn test_unparsable_entry_on_other_day_is_not_examined() {
        let mut schedule = schedule_with(0, vec![entry("GOOD", "2024-01-01T15:00:00")]);
        schedule.day_mut(1).unwrap().push(entry("BAD", "nope"));
        assert_eq!(course(resolve(&schedule, at(1, 8, 0))).as_deref(), Some("GOOD"));
    }

    #[test]
    fn test_offset_timestamps_convert_to_clock_zone() {
        let pacific = FixedOffset::west_opt(8 * 3600).unwrap();
        // 22:30Z is 14:30 in UTC-8
        assert_eq!(
            parse_start_time("2024-01-01T22:30:00Z", &pacific),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_start_time("2024-01-01T14:30:00", &pacific),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_start_time("2024-01-01 14:30", &Utc),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(parse_start_time("14:30", &Utc), None);
    }

    #[test]
    fn test_custom_offset() {
        let schedule = schedule_with(0, vec![entry("CS 100", "2024-01-01T09:00:00")]);
        let policy = ResolverPolicy {
            clock_offset_minutes: 0,
        };
        let result = resolve_next_class(Some(&schedule), &at(1, 8, 59), &policy).unwrap();
        assert_eq!(course(result).as_deref(), Some("CS 100"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let schedule = schedule_with(
            0,
            vec![
                entry("A", "2024-01-01T10:00:00"),
                entry("B", "2024-01-01T17:00:00"),
            ],
        );
        let now = at(1, 5, 0);
        assert_eq!(resolve(&schedule, now), resolve(&schedule, now));
    }
}
