//! Public data model for the navigation engine.
//!
//! This file consolidates the types exchanged between the store, the
//! resolver, the route service and the presentation layer. Types that cross
//! a JSON boundary derive Serialize/Deserialize and keep the wire field names
//! (`courseNumber`, `locationInfo`, `timeInfo`, ...).

use serde::{Deserialize, Serialize};

/// Number of day-slots in a [`WeeklySchedule`].
pub const DAYS_PER_WEEK: usize = 7;

/// Store key holding the JSON-encoded session identifier.
pub const UID_KEY: &str = "uid";

/// Store key holding the JSON-encoded weekly schedule.
pub const SCHEDULE_KEY: &str = "Schedule";

/// Where a class takes place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub building_name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// When a class starts.
///
/// `start_time` is kept as the raw ISO-8601 text; it is parsed when the
/// resolver needs it so that malformed values surface as data errors at
/// resolution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInfo {
    pub start_time: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One class in a day-slot.
///
/// Fields the engine does not interpret (course title, instructor, end time...)
/// are preserved in `extra` for the course card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassEntry {
    pub course_number: String,
    pub location_info: LocationInfo,
    pub time_info: TimeInfo,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClassEntry {
    pub fn new(
        course_number: impl Into<String>,
        building_name: impl Into<String>,
        start_time: impl Into<String>,
    ) -> Self {
        Self {
            course_number: course_number.into(),
            location_info: LocationInfo {
                building_name: building_name.into(),
                extra: serde_json::Map::new(),
            },
            time_info: TimeInfo {
                start_time: start_time.into(),
                extra: serde_json::Map::new(),
            },
            extra: serde_json::Map::new(),
        }
    }

    pub fn building_name(&self) -> &str {
        &self.location_info.building_name
    }

    pub fn start_time(&self) -> &str {
        &self.time_info.start_time
    }
}

/// Seven day-slots of classes; slot 0 is Monday.
///
/// Serialized as a bare JSON array of arrays. Entries inside a slot keep
/// their stored order and are not assumed to be sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<ClassEntry>>", into = "Vec<Vec<ClassEntry>>")]
pub struct WeeklySchedule {
    days: Vec<Vec<ClassEntry>>,
}

impl WeeklySchedule {
    /// Build a schedule from exactly [`DAYS_PER_WEEK`] day-slots.
    pub fn new(days: Vec<Vec<ClassEntry>>) -> Result<Self, String> {
        if days.len() != DAYS_PER_WEEK {
            return Err(format!(
                "Weekly schedule must have {} day-slots, found {}",
                DAYS_PER_WEEK,
                days.len()
            ));
        }
        Ok(Self { days })
    }

    /// A schedule with every day-slot empty.
    pub fn empty() -> Self {
        Self {
            days: vec![Vec::new(); DAYS_PER_WEEK],
        }
    }

    /// Classes for a day-slot; out-of-range indices read as an empty day.
    pub fn day(&self, index: i64) -> &[ClassEntry] {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.days.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn day_mut(&mut self, index: usize) -> Option<&mut Vec<ClassEntry>> {
        self.days.get_mut(index)
    }

    pub fn days(&self) -> &[Vec<ClassEntry>] {
        &self.days
    }
}

impl TryFrom<Vec<Vec<ClassEntry>>> for WeeklySchedule {
    type Error = String;

    fn try_from(days: Vec<Vec<ClassEntry>>) -> Result<Self, Self::Error> {
        Self::new(days)
    }
}

impl From<WeeklySchedule> for Vec<Vec<ClassEntry>> {
    fn from(schedule: WeeklySchedule) -> Self {
        schedule.days
    }
}

/// A single device position reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude in meters (unknown on some devices)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, altitude: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// Opaque path node as returned by the route service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteNode(pub serde_json::Value);

/// Opaque path edge as returned by the route service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteEdge(pub serde_json::Value);

/// Normalized walking route to the next class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub nodes: Vec<RouteNode>,
    pub edges: Vec<RouteEdge>,
    /// Walking time, rounded up to whole minutes
    pub minutes_needed: u32,
    /// Path length, rounded up to whole meters
    pub distance_meters: u32,
}

/// What the resolver found for today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "class", rename_all = "snake_case")]
pub enum NextClass {
    /// A concrete upcoming class.
    Class(ClassEntry),
    /// Today's day-slot is empty.
    NoClassesToday,
}

/// Observable navigation state published to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NavigationState {
    /// Nothing resolved yet.
    Loading,
    /// Today's day-slot is empty.
    NoClassesToday,
    /// A route to the next class is shown but not being followed.
    PreviewingRoute {
        next_class: ClassEntry,
        route: RouteResult,
    },
    /// The user is following the route.
    Navigating {
        next_class: ClassEntry,
        route: RouteResult,
    },
    /// Repeated failures while nothing has been resolved yet.
    Unavailable { reason: String },
}

impl NavigationState {
    /// Short state name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            NavigationState::Loading => "loading",
            NavigationState::NoClassesToday => "no_classes_today",
            NavigationState::PreviewingRoute { .. } => "previewing_route",
            NavigationState::Navigating { .. } => "navigating",
            NavigationState::Unavailable { .. } => "unavailable",
        }
    }

    pub fn route(&self) -> Option<&RouteResult> {
        match self {
            NavigationState::PreviewingRoute { route, .. }
            | NavigationState::Navigating { route, .. } => Some(route),
            _ => None,
        }
    }

    pub fn next_class(&self) -> Option<&ClassEntry> {
        match self {
            NavigationState::PreviewingRoute { next_class, .. }
            | NavigationState::Navigating { next_class, .. } => Some(next_class),
            _ => None,
        }
    }
}

/// Latest values read from the persistent store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub uid: Option<String>,
    pub schedule: Option<WeeklySchedule>,
}

impl SessionSnapshot {
    pub fn screen(&self) -> AppScreen {
        AppScreen::for_snapshot(self)
    }
}

/// Top-level screen the presentation layer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppScreen {
    /// No session identity stored yet.
    SignIn,
    /// Signed in, but no schedule stored yet.
    ScheduleSetup,
    /// Signed in with a schedule; navigation is live.
    Landing,
}

impl AppScreen {
    pub fn for_snapshot(snapshot: &SessionSnapshot) -> Self {
        match (&snapshot.uid, &snapshot.schedule) {
            (None, _) => AppScreen::SignIn,
            (Some(_), None) => AppScreen::ScheduleSetup,
            (Some(_), Some(_)) => AppScreen::Landing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_entry_wire_names() {
        let json = r#"{
            "courseNumber": "CS 100",
            "courseTitle": "Intro",
            "locationInfo": {"buildingName": "Bourns Hall", "room": "A125"},
            "timeInfo": {"startTime": "2024-01-01T14:30:00"}
        }"#;
        let entry: ClassEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.course_number, "CS 100");
        assert_eq!(entry.building_name(), "Bourns Hall");
        assert_eq!(entry.start_time(), "2024-01-01T14:30:00");
        assert_eq!(entry.extra["courseTitle"], "Intro");
        assert_eq!(entry.location_info.extra["room"], "A125");

        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["courseTitle"], "Intro");
        assert_eq!(back["locationInfo"]["buildingName"], "Bourns Hall");
    }

    #[test]
    fn test_weekly_schedule_requires_seven_days() {
        let json = "[[],[],[],[],[],[]]";
        assert!(serde_json::from_str::<WeeklySchedule>(json).is_err());

        let json = "[[],[],[],[],[],[],[]]";
        let schedule: WeeklySchedule = serde_json::from_str(json).unwrap();
        assert_eq!(schedule.days().len(), DAYS_PER_WEEK);
    }

    #[test]
    fn test_weekly_schedule_out_of_range_day_is_empty() {
        let schedule = WeeklySchedule::empty();
        assert!(schedule.day(-1).is_empty());
        assert!(schedule.day(7).is_empty());
    }

    #[test]
    fn test_screen_for_snapshot() {
        let mut snapshot = SessionSnapshot::default();
        assert_eq!(snapshot.screen(), AppScreen::SignIn);

        snapshot.schedule = Some(WeeklySchedule::empty());
        assert_eq!(snapshot.screen(), AppScreen::SignIn);

        snapshot.uid = Some("user-1".to_string());
        assert_eq!(snapshot.screen(), AppScreen::Landing);

        snapshot.schedule = None;
        assert_eq!(snapshot.screen(), AppScreen::ScheduleSetup);
    }
}
