use classroute::api::{ClassEntry, WeeklySchedule};

/// A class in Bourns Hall starting at `start` (`HH:MM`, on 2024-01-01).
pub fn class_at(course: &str, start: &str) -> ClassEntry {
    ClassEntry::new(course, "Bourns Hall", format!("2024-01-01T{}:00", start))
}

/// A schedule with `entries` on day-slot `day` and every other slot empty.
pub fn schedule_on(day: usize, entries: Vec<ClassEntry>) -> WeeklySchedule {
    let mut schedule = WeeklySchedule::empty();
    if let Some(slot) = schedule.day_mut(day) {
        *slot = entries;
    }
    schedule
}
