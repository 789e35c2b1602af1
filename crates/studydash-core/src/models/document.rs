//! The per-user dashboard document and the records it holds.
//!
//! Every record keeps unknown JSON keys in a flattened `extra` map so that
//! documents written by older clients (flat `courseCode`, `venue`, ... fields)
//! survive a load/save cycle untouched. Optional record fields are written
//! as `null` when unset, so a stored `"courseId": null` comes back as-is.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::properties::{Properties, PropertyDefinitions};
use super::serde_util::{compact_f64, string_or_number};
use crate::{Error, Result};

/// Unknown keys carried through untouched.
pub type Extra = Map<String, JsonValue>;

// =============================================================================
// SEMESTERS & COURSES
// =============================================================================

/// A named grouping (e.g. "Fall 2025") used to scope the other collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Semester {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Sort key; not unique.
    #[serde(default)]
    pub order: u32,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Weak reference to a [`Semester`]; always serialized, `null` when unset.
    #[serde(default)]
    pub semester_id: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    /// Completion percentage, 0–100.
    #[serde(default, with = "compact_f64")]
    pub progress: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Course {
    /// Legacy flat string field (`courseCode`, `venue`, ...), if present.
    pub fn legacy_field(&self, key: &str) -> Option<String> {
        match self.extra.get(key)? {
            JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

// =============================================================================
// CALENDAR
// =============================================================================

/// Calendar event category. Types this build does not know are kept as
/// written so a save never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EventType {
    Assignment,
    Exam,
    Quiz,
    Presentation,
    #[default]
    Personal,
    Lecture,
    Meeting,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Assignment => "assignment",
            EventType::Exam => "exam",
            EventType::Quiz => "quiz",
            EventType::Presentation => "presentation",
            EventType::Personal => "personal",
            EventType::Lecture => "lecture",
            EventType::Meeting => "meeting",
            EventType::Other(raw) => raw,
        }
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "assignment" => EventType::Assignment,
            "exam" => EventType::Exam,
            "quiz" => EventType::Quiz,
            "presentation" => EventType::Presentation,
            "personal" => EventType::Personal,
            "lecture" => EventType::Lecture,
            "meeting" => EventType::Meeting,
            _ => EventType::Other(raw),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(EventType::from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// `HH:MM`.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub semester_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// =============================================================================
// TIMETABLE
// =============================================================================

/// Day of the week, used as the timetable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Day::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown weekday '{}'", s)))
    }
}

impl From<chrono::Weekday> for Day {
    fn from(w: chrono::Weekday) -> Self {
        match w {
            chrono::Weekday::Mon => Day::Monday,
            chrono::Weekday::Tue => Day::Tuesday,
            chrono::Weekday::Wed => Day::Wednesday,
            chrono::Weekday::Thu => Day::Thursday,
            chrono::Weekday::Fri => Day::Friday,
            chrono::Weekday::Sat => Day::Saturday,
            chrono::Weekday::Sun => Day::Sunday,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    /// Unique within its day. Clients mint these from millisecond
    /// timestamps, so they need the full 64 bits.
    pub period: u64,
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub venue: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Weekly timetable. All seven days are always serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    #[serde(default)]
    pub monday: Vec<TimetableSlot>,
    #[serde(default)]
    pub tuesday: Vec<TimetableSlot>,
    #[serde(default)]
    pub wednesday: Vec<TimetableSlot>,
    #[serde(default)]
    pub thursday: Vec<TimetableSlot>,
    #[serde(default)]
    pub friday: Vec<TimetableSlot>,
    #[serde(default)]
    pub saturday: Vec<TimetableSlot>,
    #[serde(default)]
    pub sunday: Vec<TimetableSlot>,
}

impl Timetable {
    pub fn day(&self, day: Day) -> &[TimetableSlot] {
        match day {
            Day::Monday => &self.monday,
            Day::Tuesday => &self.tuesday,
            Day::Wednesday => &self.wednesday,
            Day::Thursday => &self.thursday,
            Day::Friday => &self.friday,
            Day::Saturday => &self.saturday,
            Day::Sunday => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, day: Day) -> &mut Vec<TimetableSlot> {
        match day {
            Day::Monday => &mut self.monday,
            Day::Tuesday => &mut self.tuesday,
            Day::Wednesday => &mut self.wednesday,
            Day::Thursday => &mut self.thursday,
            Day::Friday => &mut self.friday,
            Day::Saturday => &mut self.saturday,
            Day::Sunday => &mut self.sunday,
        }
    }

    /// Total number of slots across the week.
    pub fn slot_count(&self) -> usize {
        Day::ALL.iter().map(|d| self.day(*d).len()).sum()
    }

    /// Reject a day's slot list that repeats a period number.
    pub fn validate_periods(slots: &[TimetableSlot]) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for slot in slots {
            if !seen.insert(slot.period) {
                return Err(Error::InvalidInput(format!(
                    "Period {} appears more than once",
                    slot.period
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// MIND SPACE (NOTES & TASKS)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Text,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// A file embedded in a mind-space item, data inline as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedFile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindSpaceItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub file: Option<EmbeddedFile>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub semester_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

// =============================================================================
// FILES & GRADES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_type: String,
    /// Base64 data URL; embedded, not externally stored.
    #[serde(default)]
    pub file_data: Option<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub uploaded_at: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    pub id: String,
    #[serde(default)]
    pub course_id: Option<String>,
    /// Letter grade, see [`crate::grading`].
    #[serde(default)]
    pub grade: String,
    /// String-typed numeric.
    #[serde(default, deserialize_with = "string_or_number")]
    pub credits: String,
    /// Free-text semester *name*, deliberately not a semester id.
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(flatten)]
    pub extra: Extra,
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// The single JSON aggregate of everything a user stores.
///
/// Persisted wholesale on every save; the server never merges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub calendar_events: Vec<CalendarEvent>,
    #[serde(default)]
    pub mind_space_items: Vec<MindSpaceItem>,
    #[serde(default)]
    pub timetable: Timetable,
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub grades: Vec<Grade>,
    #[serde(default)]
    pub semesters: Vec<Semester>,
    #[serde(default)]
    pub property_definitions: PropertyDefinitions,
    /// Demo fixture version this document was seeded with, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_version: Option<u32>,
}

impl DashboardDocument {
    /// Empty default document (what `GET /api/data` returns for a new user).
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no collection holds anything.
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
            && self.calendar_events.is_empty()
            && self.mind_space_items.is_empty()
            && self.timetable.slot_count() == 0
            && self.files.is_empty()
            && self.grades.is_empty()
            && self.semesters.is_empty()
    }
}
