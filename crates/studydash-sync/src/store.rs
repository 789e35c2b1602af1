//! In-memory dashboard state and its only write path.
//!
//! [`DashboardStore`] owns one [`DashboardDocument`]. Every mutator validates
//! its input, applies the change atomically and bumps [`DashboardStore::revision`]
//! when (and only when) state actually changed. The autosave engine compares
//! revisions to decide whether a PUT is needed.

use chrono::{NaiveDate, NaiveTime, SecondsFormat, Utc};
use tracing::trace;

use studydash_core::{
    cgpa, gpa, CalendarEvent, Course, DashboardDocument, Day, EmbeddedFile, Error, EventType,
    FileRecord, GpaSummary, Grade, GradeScale, ItemKind, MindSpaceItem, Priority, Properties,
    PropertyDefinition, PropertyEntity, PropertyType, Result, Semester, Timetable, TimetableSlot,
    DATE_FORMAT,
};

/// Raw `(key, value)` form input for an entity's properties. Keys may be a
/// definition id or a property name.
pub type PropertyInput = Vec<(String, String)>;

/// Display name used when a course reference cannot be resolved.
pub const UNKNOWN_COURSE: &str = "Unknown course";

const TIME_FORMAT: &str = "%H:%M";

/// ISO-8601 timestamp with millisecond precision, as stored in `createdAt`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Millisecond-timestamp id source. Strictly increasing within one store.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn next_id(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        self.last = now.max(self.last + 1);
        self.last.to_string()
    }

    /// Never hand out an id at or below a numeric id already in use.
    pub fn observe(&mut self, id: &str) {
        if let Ok(n) = id.parse::<i64>() {
            self.last = self.last.max(n);
        }
    }
}

// =============================================================================
// MUTATOR INPUTS
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CourseInput {
    pub name: String,
    pub semester_id: Option<String>,
    pub progress: f64,
    pub color: String,
    pub properties: PropertyInput,
}

/// Partial course update. `None` leaves a field alone; `properties` entries
/// are merged key by key.
#[derive(Debug, Clone, Default)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub semester_id: Option<Option<String>>,
    pub progress: Option<f64>,
    pub color: Option<String>,
    pub properties: PropertyInput,
}

#[derive(Debug, Clone, Default)]
pub struct EventInput {
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub event_type: EventType,
    pub course_id: Option<String>,
    pub semester_id: Option<String>,
    pub description: Option<String>,
    pub properties: PropertyInput,
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<Option<String>>,
    pub event_type: Option<EventType>,
    pub course_id: Option<Option<String>>,
    pub semester_id: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub properties: PropertyInput,
}

#[derive(Debug, Clone, Default)]
pub struct MindSpaceInput {
    pub title: String,
    pub content: Option<String>,
    pub kind: ItemKind,
    pub priority: Priority,
    pub file: Option<EmbeddedFile>,
    pub semester_id: Option<String>,
    pub properties: PropertyInput,
}

#[derive(Debug, Clone, Default)]
pub struct MindSpacePatch {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub file: Option<Option<EmbeddedFile>>,
    pub semester_id: Option<Option<String>>,
    pub properties: PropertyInput,
}

#[derive(Debug, Clone, Default)]
pub struct FileInput {
    pub name: String,
    pub course_id: Option<String>,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub file_data: Option<String>,
    pub properties: PropertyInput,
}

#[derive(Debug, Clone, Default)]
pub struct GradeInput {
    pub course_id: Option<String>,
    pub grade: String,
    pub credits: String,
    pub semester: String,
    pub properties: PropertyInput,
}

#[derive(Debug, Clone, Default)]
pub struct GradePatch {
    pub course_id: Option<Option<String>>,
    pub grade: Option<String>,
    pub credits: Option<String>,
    pub semester: Option<String>,
    pub properties: PropertyInput,
}

// =============================================================================
// VALIDATION HELPERS
// =============================================================================

fn required(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", what)));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn validate_date(date: &str) -> Result<String> {
    let trimmed = required(date, "Date")?;
    NaiveDate::parse_from_str(&trimmed, DATE_FORMAT).map_err(|_| {
        Error::InvalidInput(format!("'{}' is not a date (YYYY-MM-DD)", trimmed))
    })?;
    Ok(trimmed)
}

fn validate_time(time: Option<String>) -> Result<Option<String>> {
    match non_blank(time) {
        Some(t) => {
            NaiveTime::parse_from_str(&t, TIME_FORMAT)
                .map_err(|_| Error::InvalidInput(format!("'{}' is not a time (HH:MM)", t)))?;
            Ok(Some(t))
        }
        None => Ok(None),
    }
}

fn validate_credits(credits: &str) -> Result<String> {
    let trimmed = required(credits, "Credits")?;
    match trimmed.parse::<f64>() {
        Ok(c) if c.is_finite() && c >= 0.0 => Ok(trimmed),
        _ => Err(Error::InvalidInput(format!(
            "Credits must be a number, got '{}'",
            trimmed
        ))),
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_finite() {
        progress.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn apply_properties(
    props: &mut Properties,
    defs: &[PropertyDefinition],
    input: PropertyInput,
) -> Result<()> {
    for (key, raw) in input {
        props.set_validated(defs, &key, &raw)?;
    }
    Ok(())
}

fn check_file_item(item: &MindSpaceItem) -> Result<()> {
    if item.kind == ItemKind::File && item.file.is_none() {
        return Err(Error::InvalidInput("A file item requires a file".to_string()));
    }
    Ok(())
}

fn not_found(what: &str, id: &str) -> Error {
    Error::NotFound(format!("{} {}", what, id))
}

// =============================================================================
// STORE
// =============================================================================

/// The application state of one signed-in session.
#[derive(Debug, Clone, Default)]
pub struct DashboardStore {
    doc: DashboardDocument,
    revision: u64,
    ids: IdGenerator,
    scale: GradeScale,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `doc` at revision 0.
    pub fn from_document(doc: DashboardDocument) -> Self {
        let mut store = Self::new();
        store.observe_ids(&doc);
        store.doc = doc;
        store
    }

    pub fn with_scale(mut self, scale: GradeScale) -> Self {
        self.scale = scale;
        self
    }

    /// Bumped once per state-changing mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn scale(&self) -> GradeScale {
        self.scale
    }

    fn touch(&mut self, op: &'static str) {
        self.revision += 1;
        trace!(
            subsystem = "sync",
            component = "store",
            op,
            revision = self.revision,
            "Store mutated"
        );
    }

    fn observe_ids(&mut self, doc: &DashboardDocument) {
        let ids = doc
            .courses
            .iter()
            .map(|c| c.id.as_str())
            .chain(doc.calendar_events.iter().map(|e| e.id.as_str()))
            .chain(doc.mind_space_items.iter().map(|i| i.id.as_str()))
            .chain(doc.files.iter().map(|f| f.id.as_str()))
            .chain(doc.grades.iter().map(|g| g.id.as_str()))
            .chain(doc.semesters.iter().map(|s| s.id.as_str()));
        for id in ids {
            self.ids.observe(id);
        }
    }

    // ─── Whole document ────────────────────────────────────────────────────

    /// Install a whole document (load, seeding).
    pub fn replace_document(&mut self, doc: DashboardDocument) {
        self.observe_ids(&doc);
        self.doc = doc;
        self.touch("replace_document");
    }

    pub fn document(&self) -> &DashboardDocument {
        &self.doc
    }

    /// Snapshot to send with a save.
    pub fn to_document(&self) -> DashboardDocument {
        self.doc.clone()
    }

    // ─── Courses ───────────────────────────────────────────────────────────

    pub fn courses(&self) -> &[Course] {
        &self.doc.courses
    }

    pub fn add_course(&mut self, input: CourseInput) -> Result<Course> {
        let name = required(&input.name, "Course name")?;
        let mut properties = Properties::new();
        apply_properties(
            &mut properties,
            &self.doc.property_definitions.courses,
            input.properties,
        )?;

        let course = Course {
            id: self.ids.next_id(),
            name,
            semester_id: non_blank(input.semester_id),
            properties,
            progress: clamp_progress(input.progress),
            color: input.color,
            created_at: Some(timestamp()),
            extra: Default::default(),
        };
        self.doc.courses.push(course.clone());
        self.touch("add_course");
        Ok(course)
    }

    pub fn update_course(&mut self, id: &str, patch: CoursePatch) -> Result<Course> {
        let defs = &self.doc.property_definitions.courses;
        let course = self
            .doc
            .courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Course", id))?;

        let mut updated = course.clone();
        if let Some(name) = patch.name {
            updated.name = required(&name, "Course name")?;
        }
        if let Some(semester_id) = patch.semester_id {
            updated.semester_id = non_blank(semester_id);
        }
        if let Some(progress) = patch.progress {
            updated.progress = clamp_progress(progress);
        }
        if let Some(color) = patch.color {
            updated.color = color;
        }
        apply_properties(&mut updated.properties, defs, patch.properties)?;

        let changed = *course != updated;
        *course = updated.clone();
        if changed {
            self.touch("update_course");
        }
        Ok(updated)
    }

    /// Remove a course and every timetable slot and calendar event that
    /// references it.
    pub fn delete_course(&mut self, id: &str) -> bool {
        let before = self.doc.courses.len();
        self.doc.courses.retain(|c| c.id != id);
        if self.doc.courses.len() == before {
            return false;
        }
        for day in Day::ALL {
            self.doc.timetable.day_mut(day).retain(|s| s.course_id != id);
        }
        self.doc
            .calendar_events
            .retain(|e| e.course_id.as_deref() != Some(id));
        self.touch("delete_course");
        true
    }

    pub fn course_by_id(&self, id: &str) -> Option<&Course> {
        self.doc.courses.iter().find(|c| c.id == id)
    }

    /// Course name, then the legacy `courseName` field, then
    /// [`UNKNOWN_COURSE`].
    pub fn course_display_name(&self, id: &str) -> String {
        self.course_by_id(id)
            .and_then(|c| {
                let name = c.name.trim();
                if name.is_empty() {
                    c.legacy_field("courseName")
                } else {
                    Some(name.to_string())
                }
            })
            .unwrap_or_else(|| UNKNOWN_COURSE.to_string())
    }

    /// A course property by definition id or name, falling back to the flat
    /// fields older documents stored (`courseCode`, `venue`, `faculty`,
    /// `credits`).
    pub fn course_property(&self, course: &Course, key: &str) -> Option<String> {
        let defs = &self.doc.property_definitions.courses;
        if let Some(value) = course.properties.lookup(defs, key) {
            let text = value.to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
        let name = defs
            .iter()
            .find(|d| d.id == key)
            .map(|d| d.name.as_str())
            .unwrap_or(key);
        legacy_course_field(name).and_then(|field| course.legacy_field(field))
    }

    // ─── Semesters ─────────────────────────────────────────────────────────

    pub fn semesters(&self) -> &[Semester] {
        &self.doc.semesters
    }

    /// New semesters sort after every existing one.
    pub fn add_semester(&mut self, name: &str) -> Result<Semester> {
        let name = required(name, "Semester name")?;
        let order = self
            .doc
            .semesters
            .iter()
            .map(|s| s.order + 1)
            .max()
            .unwrap_or(0);
        let semester = Semester {
            id: self.ids.next_id(),
            name,
            order,
            extra: Default::default(),
        };
        self.doc.semesters.push(semester.clone());
        self.touch("add_semester");
        Ok(semester)
    }

    pub fn update_semester(&mut self, id: &str, name: &str) -> Result<Semester> {
        let name = required(name, "Semester name")?;
        let semester = self
            .doc
            .semesters
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("Semester", id))?;
        let changed = semester.name != name;
        semester.name = name;
        let updated = semester.clone();
        if changed {
            self.touch("update_semester");
        }
        Ok(updated)
    }

    /// Remove a semester. Courses, events and mind-space items that pointed
    /// at it lose their `semesterId` but are kept.
    pub fn delete_semester(&mut self, id: &str) -> bool {
        let before = self.doc.semesters.len();
        self.doc.semesters.retain(|s| s.id != id);
        if self.doc.semesters.len() == before {
            return false;
        }
        let matches = |semester_id: &Option<String>| semester_id.as_deref() == Some(id);
        for course in &mut self.doc.courses {
            if matches(&course.semester_id) {
                course.semester_id = None;
            }
        }
        for event in &mut self.doc.calendar_events {
            if matches(&event.semester_id) {
                event.semester_id = None;
            }
        }
        for item in &mut self.doc.mind_space_items {
            if matches(&item.semester_id) {
                item.semester_id = None;
            }
        }
        self.touch("delete_semester");
        true
    }

    pub fn semester_by_id(&self, id: &str) -> Option<&Semester> {
        self.doc.semesters.iter().find(|s| s.id == id)
    }

    /// Semesters by `order`; ties keep document order.
    pub fn semesters_sorted(&self) -> Vec<&Semester> {
        let mut semesters: Vec<_> = self.doc.semesters.iter().collect();
        semesters.sort_by_key(|s| s.order);
        semesters
    }

    // ─── Calendar ──────────────────────────────────────────────────────────

    pub fn calendar_events(&self) -> &[CalendarEvent] {
        &self.doc.calendar_events
    }

    pub fn add_calendar_event(&mut self, input: EventInput) -> Result<CalendarEvent> {
        let title = required(&input.title, "Title")?;
        let date = validate_date(&input.date)?;
        let time = validate_time(input.time)?;
        let mut properties = Properties::new();
        apply_properties(
            &mut properties,
            &self.doc.property_definitions.calendar_events,
            input.properties,
        )?;

        let event = CalendarEvent {
            id: self.ids.next_id(),
            title,
            date,
            time,
            event_type: input.event_type,
            course_id: non_blank(input.course_id),
            semester_id: non_blank(input.semester_id),
            description: non_blank(input.description),
            properties,
            created_at: Some(timestamp()),
            extra: Default::default(),
        };
        self.doc.calendar_events.push(event.clone());
        self.touch("add_calendar_event");
        Ok(event)
    }

    pub fn update_calendar_event(&mut self, id: &str, patch: EventPatch) -> Result<CalendarEvent> {
        let defs = &self.doc.property_definitions.calendar_events;
        let event = self
            .doc
            .calendar_events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Event", id))?;

        let mut updated = event.clone();
        if let Some(title) = patch.title {
            updated.title = required(&title, "Title")?;
        }
        if let Some(date) = patch.date {
            updated.date = validate_date(&date)?;
        }
        if let Some(time) = patch.time {
            updated.time = validate_time(time)?;
        }
        if let Some(event_type) = patch.event_type {
            updated.event_type = event_type;
        }
        if let Some(course_id) = patch.course_id {
            updated.course_id = non_blank(course_id);
        }
        if let Some(semester_id) = patch.semester_id {
            updated.semester_id = non_blank(semester_id);
        }
        if let Some(description) = patch.description {
            updated.description = non_blank(description);
        }
        apply_properties(&mut updated.properties, defs, patch.properties)?;

        let changed = *event != updated;
        *event = updated.clone();
        if changed {
            self.touch("update_calendar_event");
        }
        Ok(updated)
    }

    pub fn delete_calendar_event(&mut self, id: &str) -> bool {
        let before = self.doc.calendar_events.len();
        self.doc.calendar_events.retain(|e| e.id != id);
        let removed = self.doc.calendar_events.len() != before;
        if removed {
            self.touch("delete_calendar_event");
        }
        removed
    }

    // ─── Mind space ────────────────────────────────────────────────────────

    pub fn mind_space_items(&self) -> &[MindSpaceItem] {
        &self.doc.mind_space_items
    }

    /// New items always start incomplete. A file item without a title takes
    /// the file's name.
    pub fn add_mind_space_item(&mut self, input: MindSpaceInput) -> Result<MindSpaceItem> {
        let title = match (input.title.trim(), &input.file) {
            ("", Some(file)) if input.kind == ItemKind::File => required(&file.name, "Title")?,
            (title, _) => required(title, "Title")?,
        };
        let mut properties = Properties::new();
        apply_properties(
            &mut properties,
            &self.doc.property_definitions.mind_space_items,
            input.properties,
        )?;

        let item = MindSpaceItem {
            id: self.ids.next_id(),
            title,
            content: non_blank(input.content),
            kind: input.kind,
            priority: input.priority,
            completed: false,
            file: input.file,
            properties,
            semester_id: non_blank(input.semester_id),
            created_at: Some(timestamp()),
            extra: Default::default(),
        };
        check_file_item(&item)?;
        self.doc.mind_space_items.push(item.clone());
        self.touch("add_mind_space_item");
        Ok(item)
    }

    pub fn update_mind_space_item(
        &mut self,
        id: &str,
        patch: MindSpacePatch,
    ) -> Result<MindSpaceItem> {
        let defs = &self.doc.property_definitions.mind_space_items;
        let item = self
            .doc
            .mind_space_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("Item", id))?;

        let mut updated = item.clone();
        if let Some(title) = patch.title {
            updated.title = required(&title, "Title")?;
        }
        if let Some(content) = patch.content {
            updated.content = non_blank(content);
        }
        if let Some(priority) = patch.priority {
            updated.priority = priority;
        }
        if let Some(completed) = patch.completed {
            updated.completed = completed;
        }
        if let Some(file) = patch.file {
            updated.file = file;
        }
        if let Some(semester_id) = patch.semester_id {
            updated.semester_id = non_blank(semester_id);
        }
        apply_properties(&mut updated.properties, defs, patch.properties)?;
        check_file_item(&updated)?;

        let changed = *item != updated;
        *item = updated.clone();
        if changed {
            self.touch("update_mind_space_item");
        }
        Ok(updated)
    }

    /// Flip `completed`; returns the new value.
    pub fn toggle_mind_space_item(&mut self, id: &str) -> Result<bool> {
        let item = self
            .doc
            .mind_space_items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("Item", id))?;
        item.completed = !item.completed;
        let completed = item.completed;
        self.touch("toggle_mind_space_item");
        Ok(completed)
    }

    pub fn delete_mind_space_item(&mut self, id: &str) -> bool {
        let before = self.doc.mind_space_items.len();
        self.doc.mind_space_items.retain(|i| i.id != id);
        let removed = self.doc.mind_space_items.len() != before;
        if removed {
            self.touch("delete_mind_space_item");
        }
        removed
    }

    pub fn pending_task_count(&self) -> usize {
        self.doc
            .mind_space_items
            .iter()
            .filter(|i| !i.completed)
            .count()
    }

    pub fn completed_task_count(&self) -> usize {
        self.doc
            .mind_space_items
            .iter()
            .filter(|i| i.completed)
            .count()
    }

    // ─── Timetable ─────────────────────────────────────────────────────────

    pub fn timetable(&self) -> &Timetable {
        &self.doc.timetable
    }

    /// Replace one day's slots. Periods must be unique within the day;
    /// overlapping times are allowed.
    pub fn update_timetable(&mut self, day: Day, slots: Vec<TimetableSlot>) -> Result<()> {
        Timetable::validate_periods(&slots)?;
        let current = self.doc.timetable.day_mut(day);
        if *current == slots {
            return Ok(());
        }
        *current = slots;
        self.touch("update_timetable");
        Ok(())
    }

    // ─── Files ─────────────────────────────────────────────────────────────

    pub fn files(&self) -> &[FileRecord] {
        &self.doc.files
    }

    pub fn add_file(&mut self, input: FileInput) -> Result<FileRecord> {
        let file_name = required(&input.file_name, "File name")?;
        let name = non_blank(Some(input.name)).unwrap_or_else(|| file_name.clone());
        let mut properties = Properties::new();
        apply_properties(
            &mut properties,
            &self.doc.property_definitions.files,
            input.properties,
        )?;

        let file = FileRecord {
            id: self.ids.next_id(),
            name,
            course_id: non_blank(input.course_id),
            file_name,
            file_size: input.file_size,
            file_type: input.file_type,
            file_data: input.file_data,
            properties,
            uploaded_at: Some(timestamp()),
            extra: Default::default(),
        };
        self.doc.files.push(file.clone());
        self.touch("add_file");
        Ok(file)
    }

    pub fn delete_file(&mut self, id: &str) -> bool {
        let before = self.doc.files.len();
        self.doc.files.retain(|f| f.id != id);
        let removed = self.doc.files.len() != before;
        if removed {
            self.touch("delete_file");
        }
        removed
    }

    // ─── Grades ────────────────────────────────────────────────────────────

    pub fn grades(&self) -> &[Grade] {
        &self.doc.grades
    }

    pub fn add_grade(&mut self, input: GradeInput) -> Result<Grade> {
        let letter = required(&input.grade, "Grade")?;
        let credits = validate_credits(&input.credits)?;
        let mut properties = Properties::new();
        apply_properties(
            &mut properties,
            &self.doc.property_definitions.grades,
            input.properties,
        )?;

        let grade = Grade {
            id: self.ids.next_id(),
            course_id: non_blank(input.course_id),
            grade: letter,
            credits,
            semester: input.semester.trim().to_string(),
            properties,
            extra: Default::default(),
        };
        self.doc.grades.push(grade.clone());
        self.touch("add_grade");
        Ok(grade)
    }

    pub fn update_grade(&mut self, id: &str, patch: GradePatch) -> Result<Grade> {
        let defs = &self.doc.property_definitions.grades;
        let grade = self
            .doc
            .grades
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("Grade", id))?;

        let mut updated = grade.clone();
        if let Some(course_id) = patch.course_id {
            updated.course_id = non_blank(course_id);
        }
        if let Some(letter) = patch.grade {
            updated.grade = required(&letter, "Grade")?;
        }
        if let Some(credits) = patch.credits {
            updated.credits = validate_credits(&credits)?;
        }
        if let Some(semester) = patch.semester {
            updated.semester = semester.trim().to_string();
        }
        apply_properties(&mut updated.properties, defs, patch.properties)?;

        let changed = *grade != updated;
        *grade = updated.clone();
        if changed {
            self.touch("update_grade");
        }
        Ok(updated)
    }

    pub fn delete_grade(&mut self, id: &str) -> bool {
        let before = self.doc.grades.len();
        self.doc.grades.retain(|g| g.id != id);
        let removed = self.doc.grades.len() != before;
        if removed {
            self.touch("delete_grade");
        }
        removed
    }

    /// GPA over the grades whose semester *name* is `semester`.
    pub fn gpa_for_semester(&self, semester: &str) -> GpaSummary {
        gpa(
            self.scale,
            self.doc.grades.iter().filter(|g| g.semester == semester),
        )
    }

    /// Credit-weighted CGPA and the number of semesters it spans.
    pub fn cgpa(&self) -> (GpaSummary, usize) {
        cgpa(self.scale, &self.doc.grades)
    }

    // ─── Property definitions ──────────────────────────────────────────────

    /// Definitions for `entity`, sorted by `order`.
    pub fn property_definitions(&self, entity: PropertyEntity) -> Vec<&PropertyDefinition> {
        self.doc.property_definitions.sorted(entity)
    }

    /// Declare a new property. Names are unique per entity type,
    /// case-insensitively.
    pub fn add_property_definition(
        &mut self,
        entity: PropertyEntity,
        name: &str,
        kind: PropertyType,
    ) -> Result<PropertyDefinition> {
        let name = required(name, "Property name")?;
        let existing = self.doc.property_definitions.get(entity);
        if existing.iter().any(|d| d.name.eq_ignore_ascii_case(&name)) {
            return Err(Error::Conflict(format!(
                "Property '{}' already exists for {}",
                name, entity
            )));
        }
        let order = existing.iter().map(|d| d.order + 1).max().unwrap_or(0);
        let def = PropertyDefinition {
            id: self.ids.next_id(),
            name,
            kind,
            order,
        };
        self.doc
            .property_definitions
            .get_mut(entity)
            .push(def.clone());
        self.touch("add_property_definition");
        Ok(def)
    }

    /// Remove a definition and its values from every entity of that type.
    pub fn delete_property_definition(&mut self, entity: PropertyEntity, id: &str) -> bool {
        let defs = self.doc.property_definitions.get_mut(entity);
        let Some(pos) = defs.iter().position(|d| d.id == id) else {
            return false;
        };
        let def = defs.remove(pos);

        match entity {
            PropertyEntity::Courses => {
                for c in &mut self.doc.courses {
                    c.properties.remove_definition(&def);
                }
            }
            PropertyEntity::CalendarEvents => {
                for e in &mut self.doc.calendar_events {
                    e.properties.remove_definition(&def);
                }
            }
            PropertyEntity::MindSpaceItems => {
                for i in &mut self.doc.mind_space_items {
                    i.properties.remove_definition(&def);
                }
            }
            PropertyEntity::Files => {
                for f in &mut self.doc.files {
                    f.properties.remove_definition(&def);
                }
            }
            PropertyEntity::Grades => {
                for g in &mut self.doc.grades {
                    g.properties.remove_definition(&def);
                }
            }
        }
        self.touch("delete_property_definition");
        true
    }
}

/// Flat field that held a course property before the properties map existed.
fn legacy_course_field(name: &str) -> Option<&'static str> {
    match name.trim().to_ascii_lowercase().as_str() {
        "course code" | "coursecode" | "code" => Some("courseCode"),
        "venue" => Some("venue"),
        "faculty" => Some("faculty"),
        "credits" => Some("credits"),
        _ => None,
    }
}
