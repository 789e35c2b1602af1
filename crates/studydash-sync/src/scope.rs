//! Semester scoping: the "current semester" filter every view applies.

use std::collections::HashSet;

use chrono::NaiveDate;

use studydash_core::{CalendarEvent, Course, Day, Grade, MindSpaceItem, TimetableSlot, DATE_FORMAT};

use crate::store::DashboardStore;

/// Number of events the dashboard's "upcoming" list shows.
pub const UPCOMING_EVENT_LIMIT: usize = 8;

/// Which semester the views are filtered to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SemesterScope {
    #[default]
    All,
    Semester(String),
}

impl SemesterScope {
    /// Interpret a selector value; `"all"` and blank mean every semester.
    pub fn from_selection(selection: Option<&str>) -> Self {
        match selection.map(str::trim) {
            None | Some("") => SemesterScope::All,
            Some(s) if s.eq_ignore_ascii_case("all") => SemesterScope::All,
            Some(id) => SemesterScope::Semester(id.to_string()),
        }
    }

    pub fn semester_id(&self) -> Option<&str> {
        match self {
            SemesterScope::All => None,
            SemesterScope::Semester(id) => Some(id),
        }
    }

    fn includes(&self, semester_id: Option<&str>) -> bool {
        match self {
            SemesterScope::All => true,
            SemesterScope::Semester(id) => semester_id == Some(id.as_str()),
        }
    }

    pub fn courses<'a>(&self, store: &'a DashboardStore) -> Vec<&'a Course> {
        store
            .courses()
            .iter()
            .filter(|c| self.includes(c.semester_id.as_deref()))
            .collect()
    }

    fn course_ids<'a>(&self, store: &'a DashboardStore) -> HashSet<&'a str> {
        self.courses(store).into_iter().map(|c| c.id.as_str()).collect()
    }

    /// Events tagged with the semester, or attached to a course in it.
    pub fn calendar_events<'a>(&self, store: &'a DashboardStore) -> Vec<&'a CalendarEvent> {
        if *self == SemesterScope::All {
            return store.calendar_events().iter().collect();
        }
        let course_ids = self.course_ids(store);
        store
            .calendar_events()
            .iter()
            .filter(|e| {
                self.includes(e.semester_id.as_deref())
                    || e
                        .course_id
                        .as_deref()
                        .is_some_and(|id| course_ids.contains(id))
            })
            .collect()
    }

    pub fn mind_space_items<'a>(&self, store: &'a DashboardStore) -> Vec<&'a MindSpaceItem> {
        store
            .mind_space_items()
            .iter()
            .filter(|i| self.includes(i.semester_id.as_deref()))
            .collect()
    }

    /// Grades match on semester *name*; an unknown semester id matches none.
    pub fn grades<'a>(&self, store: &'a DashboardStore) -> Vec<&'a Grade> {
        match self {
            SemesterScope::All => store.grades().iter().collect(),
            SemesterScope::Semester(id) => match store.semester_by_id(id) {
                Some(semester) => store
                    .grades()
                    .iter()
                    .filter(|g| g.semester == semester.name)
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    /// `day`'s slots for in-scope courses, ordered by start time.
    pub fn classes_on<'a>(&self, store: &'a DashboardStore, day: Day) -> Vec<&'a TimetableSlot> {
        let course_ids = self.course_ids(store);
        let mut slots: Vec<_> = store
            .timetable()
            .day(day)
            .iter()
            .filter(|s| course_ids.contains(s.course_id.as_str()))
            .collect();
        slots.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        slots
    }

    /// In-scope events on or after `from`, ordered by date then time, at most
    /// `limit` of them. Events with an unparsable date are skipped.
    pub fn upcoming_events<'a>(
        &self,
        store: &'a DashboardStore,
        from: NaiveDate,
        limit: usize,
    ) -> Vec<&'a CalendarEvent> {
        let mut events: Vec<_> = self
            .calendar_events(store)
            .into_iter()
            .filter(|e| {
                NaiveDate::parse_from_str(&e.date, DATE_FORMAT).is_ok_and(|d| d >= from)
            })
            .collect();
        events.sort_by(|a, b| {
            (a.date.as_str(), a.time.as_deref().unwrap_or(""))
                .cmp(&(b.date.as_str(), b.time.as_deref().unwrap_or("")))
        });
        events.truncate(limit);
        events
    }

    pub fn pending_task_count(&self, store: &DashboardStore) -> usize {
        self.mind_space_items(store)
            .iter()
            .filter(|i| !i.completed)
            .count()
    }
}
