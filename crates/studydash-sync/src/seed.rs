//! Demo account fixture and the decision of when to install it.
//!
//! The fixture spans six semesters with eight courses each, plus ten events,
//! ten notes, eight grades and eight files per semester and a Monday to
//! Saturday timetable. Property values are keyed by definition id.

use chrono::{Duration, NaiveDate};

use studydash_core::defaults::{
    DEMO_MIN_COURSES, DEMO_MIN_EVENTS, DEMO_MIN_FILES, DEMO_MIN_GRADES,
    DEMO_MIN_MIND_SPACE_ITEMS, DEMO_SEED_VERSION,
};
use studydash_core::{
    CalendarEvent, Course, DashboardDocument, Day, EventType, FileRecord, Grade, ItemKind,
    MindSpaceItem, Priority, Properties, PropertyDefinition, PropertyDefinitions, PropertyType,
    PropertyValue, Semester, Timetable, TimetableSlot, DATE_FORMAT,
};

use crate::store::timestamp;

/// Whether `doc`, just loaded for `email`, should be replaced by the demo
/// fixture.
///
/// Only the demo account is ever seeded. A document stamped with the current
/// seed version is never reseeded, whatever the user deleted since; older
/// stamps always are. Unstamped documents fall back to the count thresholds
/// earlier releases used.
pub fn needs_seed(doc: &DashboardDocument, email: &str, demo_email: &str) -> bool {
    if !email.trim().eq_ignore_ascii_case(demo_email.trim()) {
        return false;
    }
    match doc.seed_version {
        Some(version) => version < DEMO_SEED_VERSION,
        None => {
            doc.courses.len() < DEMO_MIN_COURSES
                || doc.calendar_events.len() < DEMO_MIN_EVENTS
                || doc.mind_space_items.len() < DEMO_MIN_MIND_SPACE_ITEMS
                || doc.grades.len() < DEMO_MIN_GRADES
                || doc.files.len() < DEMO_MIN_FILES
        }
    }
}

struct SemesterFixture {
    id: &'static str,
    name: &'static str,
    room_prefix: &'static str,
    courses: [CourseFixture; 8],
}

struct CourseFixture {
    name: &'static str,
    code: &'static str,
    venue: &'static str,
    faculty: &'static str,
    credits: &'static str,
    progress: f64,
    color: &'static str,
}

macro_rules! course {
    ($name:expr, $code:expr, $venue:expr, $faculty:expr, $credits:expr, $progress:expr, $color:expr) => {
        CourseFixture {
            name: $name,
            code: $code,
            venue: $venue,
            faculty: $faculty,
            credits: $credits,
            progress: $progress,
            color: $color,
        }
    };
}

const SEMESTERS: [SemesterFixture; 6] = [
    SemesterFixture {
        id: "s1",
        name: "Fall 2025",
        room_prefix: "ROOM-A",
        courses: [
            course!("Data Structures & Algorithms", "CS301", "ROOM-A101", "Dr. Sarah Chen", "4", 78.0, "#3b82f6"),
            course!("Database Management Systems", "CS302", "LAB-B205", "Prof. Michael Ross", "3", 65.0, "#a855f7"),
            course!("Operating Systems", "CS303", "ROOM-C301", "Dr. Emily Wang", "4", 52.0, "#06b6d4"),
            course!("Computer Networks", "CS304", "LAB-D102", "Prof. James Miller", "3", 41.0, "#10b981"),
            course!("Linear Algebra", "MA201", "ROOM-E201", "Dr. Lisa Anderson", "3", 88.0, "#f59e0b"),
            course!("Machine Learning", "CS305", "LAB-F301", "Dr. David Park", "4", 35.0, "#ec4899"),
            course!("Web Development", "CS306", "LAB-G102", "Prof. Anna Martinez", "3", 92.0, "#f97316"),
            course!("Software Engineering", "CS307", "ROOM-H201", "Dr. Robert Kim", "3", 70.0, "#84cc16"),
        ],
    },
    SemesterFixture {
        id: "s2",
        name: "Spring 2025",
        room_prefix: "ROOM-B",
        courses: [
            course!("Compiler Design", "CS401", "ROOM-A102", "Dr. Nina Patel", "4", 60.0, "#6366f1"),
            course!("Distributed Systems", "CS402", "LAB-B210", "Prof. Raj Verma", "3", 45.0, "#0ea5e9"),
            course!("Human Computer Interaction", "CS403", "ROOM-C302", "Dr. Priya Sharma", "3", 82.0, "#22c55e"),
            course!("Cloud Computing", "CS404", "LAB-D201", "Prof. Amit Singh", "4", 38.0, "#eab308"),
            course!("Cryptography", "CS405", "ROOM-A201", "Dr. Kevin Zhang", "3", 55.0, "#8b5cf6"),
            course!("Data Mining", "CS406", "LAB-F301", "Dr. David Park", "3", 62.0, "#ec4899"),
            course!("Mobile Application Development", "CS407", "LAB-G102", "Prof. Anna Martinez", "3", 75.0, "#f97316"),
            course!("Network Security", "CS408", "ROOM-D102", "Prof. James Miller", "3", 48.0, "#10b981"),
        ],
    },
    SemesterFixture {
        id: "s3",
        name: "Winter 2024",
        room_prefix: "ROOM-C",
        courses: [
            course!("Theory of Computation", "CS301T", "ROOM-A201", "Dr. Nina Patel", "3", 72.0, "#6366f1"),
            course!("Computer Graphics", "CS302G", "LAB-G201", "Prof. Anna Martinez", "3", 68.0, "#ec4899"),
            course!("Embedded Systems", "EC201", "LAB-EC02", "Dr. Vikram Rao", "3", 61.0, "#f59e0b"),
            course!("Digital Signal Processing", "EC202", "LAB-EC03", "Dr. Anjali Desai", "3", 58.0, "#06b6d4"),
            course!("VLSI Design", "EC203", "ROOM-EC01", "Dr. Vikram Rao", "3", 65.0, "#14b8a6"),
            course!("Control Systems", "EC204", "ROOM-EC02", "Prof. Meera Iyer", "3", 70.0, "#84cc16"),
            course!("Microprocessors", "EC205", "LAB-EC04", "Dr. Vikram Rao", "3", 54.0, "#22c55e"),
            course!("Communication Engineering", "EC206", "ROOM-EC03", "Dr. Anjali Desai", "3", 66.0, "#0ea5e9"),
        ],
    },
    SemesterFixture {
        id: "s4",
        name: "Fall 2024",
        room_prefix: "ROOM-D",
        courses: [
            course!("Discrete Mathematics", "MA102", "ROOM-E101", "Dr. Suresh Kumar", "3", 90.0, "#ef4444"),
            course!("Programming in C", "CS101", "LAB-A001", "Prof. Meera Iyer", "4", 95.0, "#d946ef"),
            course!("Digital Logic Design", "EC101", "LAB-EC01", "Dr. Vikram Rao", "3", 72.0, "#f97316"),
            course!("Engineering Physics", "PH101", "ROOM-PH01", "Dr. Anjali Desai", "3", 68.0, "#06b6d4"),
            course!("Engineering Chemistry", "CH101", "ROOM-CH01", "Dr. Anjali Desai", "3", 80.0, "#10b981"),
            course!("Engineering Mechanics", "ME101", "ROOM-ME01", "Prof. Suresh Kumar", "3", 74.0, "#f59e0b"),
            course!("Environmental Science", "EV101", "ROOM-EV01", "Dr. Priya Sharma", "2", 88.0, "#22c55e"),
            course!("Technical Communication", "HS101", "ROOM-HS01", "Prof. Meera Iyer", "2", 85.0, "#8b5cf6"),
        ],
    },
    SemesterFixture {
        id: "s5",
        name: "Spring 2024",
        room_prefix: "ROOM-E",
        courses: [
            course!("Object Oriented Programming", "CS201", "LAB-A002", "Prof. Michael Ross", "4", 88.0, "#10b981"),
            course!("Data Structures Basics", "CS202", "ROOM-A102", "Dr. Sarah Chen", "4", 85.0, "#3b82f6"),
            course!("Numerical Methods", "MA201", "ROOM-E201", "Dr. Lisa Anderson", "3", 78.0, "#f59e0b"),
            course!("Basic Electronics", "EC101", "LAB-EC01", "Dr. Vikram Rao", "3", 72.0, "#06b6d4"),
            course!("Engineering Drawing", "ME102", "ROOM-ME02", "Prof. Suresh Kumar", "2", 82.0, "#ec4899"),
            course!("Probability & Statistics", "MA202", "ROOM-E202", "Dr. Jennifer White", "3", 75.0, "#14b8a6"),
            course!("Python Programming", "CS203", "LAB-A003", "Prof. Anna Martinez", "3", 90.0, "#22c55e"),
            course!("Economics for Engineers", "HS102", "ROOM-HS02", "Prof. Meera Iyer", "2", 80.0, "#84cc16"),
        ],
    },
    SemesterFixture {
        id: "s6",
        name: "Winter 2023",
        room_prefix: "ROOM-F",
        courses: [
            course!("Engineering Chemistry", "CH101", "ROOM-CH01", "Dr. Anjali Desai", "3", 90.0, "#10b981"),
            course!("Communication Skills", "HS101", "ROOM-HS01", "Prof. Meera Iyer", "2", 88.0, "#06b6d4"),
            course!("Calculus", "MA101", "ROOM-E101", "Dr. Suresh Kumar", "4", 82.0, "#ef4444"),
            course!("Engineering Physics", "PH101", "ROOM-PH01", "Dr. Anjali Desai", "3", 76.0, "#0ea5e9"),
            course!("Problem Solving with C", "CS100", "LAB-A001", "Prof. Meera Iyer", "3", 88.0, "#3b82f6"),
            course!("Workshop Practice", "ME100", "LAB-ME01", "Prof. Suresh Kumar", "2", 92.0, "#f97316"),
            course!("Introduction to IT", "CS100I", "ROOM-A001", "Dr. Sarah Chen", "2", 85.0, "#a855f7"),
            course!("Professional Ethics", "HS100", "ROOM-HS01", "Prof. Meera Iyer", "1", 90.0, "#8b5cf6"),
        ],
    },
];

const COURSES_PER_SEMESTER: usize = 8;
const EVENTS_PER_SEMESTER: usize = 10;
const NOTES_PER_SEMESTER: usize = 10;

const COURSE_PROPERTIES: [(&str, PropertyType); 13] = [
    ("Course Code", PropertyType::Text),
    ("Venue", PropertyType::Text),
    ("Faculty", PropertyType::Text),
    ("Credits", PropertyType::Number),
    ("Section", PropertyType::Text),
    ("Prerequisites", PropertyType::Text),
    ("Office Hours", PropertyType::Text),
    ("Schedule", PropertyType::Text),
    ("Contact Hours", PropertyType::Text),
    ("Department", PropertyType::Text),
    ("Textbook", PropertyType::Text),
    ("Syllabus Link", PropertyType::Text),
    ("LMS Link", PropertyType::Text),
];
const EVENT_PROPERTIES: [(&str, PropertyType); 3] = [
    ("Location", PropertyType::Text),
    ("Reminder", PropertyType::Text),
    ("Meeting Link", PropertyType::Text),
];
const NOTE_PROPERTIES: [(&str, PropertyType); 3] = [
    ("Tags", PropertyType::Text),
    ("Due Date", PropertyType::Text),
    ("Related Course", PropertyType::Text),
];
const FILE_PROPERTIES: [(&str, PropertyType); 3] = [
    ("Category", PropertyType::Text),
    ("Notes", PropertyType::Text),
    ("Version", PropertyType::Number),
];
const GRADE_PROPERTIES: [(&str, PropertyType); 4] = [
    ("Remarks", PropertyType::Text),
    ("Grade Type", PropertyType::Text),
    ("Internal", PropertyType::Text),
    ("External", PropertyType::Text),
];

const EVENT_TITLES: [&str; EVENTS_PER_SEMESTER] = [
    "Assignment Due",
    "Mid-term Exam",
    "Quiz",
    "Project Presentation",
    "Study Group",
    "Lab Submission",
    "End-sem Exam",
    "Class Test",
    "Demo",
    "Workshop",
];
const EVENT_TYPES: [EventType; 5] = [
    EventType::Assignment,
    EventType::Exam,
    EventType::Quiz,
    EventType::Presentation,
    EventType::Personal,
];

const NOTE_TITLES: [&str; NOTES_PER_SEMESTER] = [
    "Review notes",
    "Assignment prep",
    "Lab summary",
    "Exam revision",
    "Project draft",
    "Reading summary",
    "Formula sheet",
    "Practice problems",
    "Concept map",
    "Quick reference",
];
const NOTE_PRIORITIES: [Priority; NOTES_PER_SEMESTER] = [
    Priority::High,
    Priority::High,
    Priority::Medium,
    Priority::High,
    Priority::Medium,
    Priority::Low,
    Priority::Medium,
    Priority::High,
    Priority::Low,
    Priority::Medium,
];

const GRADE_LETTERS: [&str; COURSES_PER_SEMESTER] = ["S", "A", "A", "B", "B", "B", "C", "A"];

const FILE_KINDS: [&str; 8] = [
    "Lecture_Notes.pdf",
    "Assignment.pdf",
    "Slides.pdf",
    "Lab_Manual.pdf",
    "Reference.pdf",
    "Solutions.pdf",
    "Project.zip",
    "Readings.pdf",
];

const SLOT_TIMES: [(&str, &str); 4] = [
    ("08:00", "09:30"),
    ("10:00", "11:30"),
    ("12:00", "13:00"),
    ("14:00", "15:30"),
];

/// Definitions with ids derived from `prefix` and the property name.
fn definitions(prefix: &str, props: &[(&str, PropertyType)]) -> Vec<PropertyDefinition> {
    props
        .iter()
        .enumerate()
        .map(|(order, (name, kind))| PropertyDefinition {
            id: format!("{}-{}", prefix, name.to_ascii_lowercase().replace(' ', "-")),
            name: name.to_string(),
            kind: *kind,
            order: order as u32,
        })
        .collect()
}

/// Typed values keyed by definition id. Blank values stay unset.
fn properties(defs: &[PropertyDefinition], values: &[(&str, &str)]) -> Properties {
    let mut props = Properties::new();
    for (name, raw) in values {
        let Some(def) = defs.iter().find(|d| d.name == *name) else {
            continue;
        };
        if let Ok(Some(value)) = PropertyValue::parse(def.kind, raw) {
            props.insert(def, value);
        }
    }
    props
}

fn day_offset(today: NaiveDate, days: i64) -> String {
    (today + Duration::days(days)).format(DATE_FORMAT).to_string()
}

fn file_mime(kind: &str) -> &'static str {
    if kind.ends_with(".zip") {
        "application/zip"
    } else {
        "application/pdf"
    }
}

/// Build the complete demo document with event dates relative to `today`.
pub fn demo_document(today: NaiveDate) -> DashboardDocument {
    let created_at = timestamp();
    let property_definitions = PropertyDefinitions {
        courses: definitions("course", &COURSE_PROPERTIES),
        calendar_events: definitions("event", &EVENT_PROPERTIES),
        mind_space_items: definitions("note", &NOTE_PROPERTIES),
        files: definitions("file", &FILE_PROPERTIES),
        grades: definitions("grade", &GRADE_PROPERTIES),
    };

    let mut doc = DashboardDocument {
        seed_version: Some(DEMO_SEED_VERSION),
        ..DashboardDocument::empty()
    };
    let mut period = 1;

    for (sem_idx, semester) in SEMESTERS.iter().enumerate() {
        let first_course = sem_idx * COURSES_PER_SEMESTER + 1;

        doc.semesters.push(Semester {
            id: semester.id.to_string(),
            name: semester.name.to_string(),
            order: sem_idx as u32,
            extra: Default::default(),
        });

        for (i, fixture) in semester.courses.iter().enumerate() {
            let id = first_course + i;
            let prerequisites = if id > 1 { "Previous" } else { "None" };
            doc.courses.push(Course {
                id: id.to_string(),
                name: fixture.name.to_string(),
                semester_id: Some(semester.id.to_string()),
                properties: properties(
                    &property_definitions.courses,
                    &[
                        ("Course Code", fixture.code),
                        ("Venue", fixture.venue),
                        ("Faculty", fixture.faculty),
                        ("Credits", fixture.credits),
                        ("Section", "A"),
                        ("Prerequisites", prerequisites),
                        ("Office Hours", "Tue 2–4pm"),
                        ("Schedule", "Mon/Wed 9–10"),
                        ("Contact Hours", "3 L"),
                        ("Department", "CSE"),
                        ("Textbook", "Textbook"),
                        ("Syllabus Link", "https://lms.edu"),
                        ("LMS Link", "https://lms.edu"),
                    ],
                ),
                progress: fixture.progress,
                color: fixture.color.to_string(),
                created_at: None,
                extra: Default::default(),
            });

            doc.grades.push(Grade {
                id: id.to_string(),
                course_id: Some(id.to_string()),
                grade: GRADE_LETTERS[i].to_string(),
                credits: if i % 2 == 0 { "4" } else { "3" }.to_string(),
                semester: semester.name.to_string(),
                properties: properties(
                    &property_definitions.grades,
                    &[
                        ("Remarks", "OK"),
                        ("Grade Type", "End-sem"),
                        ("Internal", "25/30"),
                        ("External", "60/70"),
                    ],
                ),
                extra: Default::default(),
            });

            let kind = FILE_KINDS[id % FILE_KINDS.len()];
            let file_name = format!("Course_{}_{}", id, kind);
            let notes = format!("For course {}", id);
            doc.files.push(FileRecord {
                id: id.to_string(),
                name: file_name.clone(),
                course_id: Some(id.to_string()),
                file_name,
                file_size: 500_000 + id as u64 * 10_000,
                file_type: file_mime(kind).to_string(),
                file_data: None,
                properties: properties(
                    &property_definitions.files,
                    &[("Category", "Course"), ("Notes", notes.as_str()), ("Version", "1")],
                ),
                uploaded_at: Some(created_at.clone()),
                extra: Default::default(),
            });
        }

        for i in 0..EVENTS_PER_SEMESTER {
            let id = sem_idx * EVENTS_PER_SEMESTER + i + 1;
            let offset = 1 + sem_idx as i64 * 14 + i as i64 * 2;
            doc.calendar_events.push(CalendarEvent {
                id: id.to_string(),
                title: format!("{} - {}", semester.name, EVENT_TITLES[i]),
                date: day_offset(today, offset),
                time: Some(if i % 2 == 0 { "10:00" } else { "14:00" }.to_string()),
                event_type: EVENT_TYPES[i % EVENT_TYPES.len()].clone(),
                course_id: Some((first_course + i % COURSES_PER_SEMESTER).to_string()),
                semester_id: Some(semester.id.to_string()),
                description: Some(format!("Event {} for {}", i + 1, semester.name)),
                properties: properties(
                    &property_definitions.calendar_events,
                    &[("Location", "Room"), ("Reminder", "1 day"), ("Meeting Link", "")],
                ),
                created_at: None,
                extra: Default::default(),
            });
        }

        for i in 0..NOTES_PER_SEMESTER {
            let id = sem_idx * NOTES_PER_SEMESTER + i + 1;
            doc.mind_space_items.push(MindSpaceItem {
                id: id.to_string(),
                title: format!("Semester {} - {}", semester.id, NOTE_TITLES[i]),
                content: Some(format!(
                    "Content for note {} in this semester. Study material and tasks.",
                    i + 1
                )),
                kind: ItemKind::Text,
                priority: NOTE_PRIORITIES[i],
                completed: i % 4 == 0,
                file: None,
                properties: properties(
                    &property_definitions.mind_space_items,
                    &[
                        ("Tags", "study"),
                        ("Due Date", "Soon"),
                        ("Related Course", "Course"),
                    ],
                ),
                semester_id: Some(semester.id.to_string()),
                created_at: Some(created_at.clone()),
                extra: Default::default(),
            });
        }

        push_timetable(&mut doc.timetable, semester, first_course, &mut period);
    }

    doc.property_definitions = property_definitions;
    doc
}

/// Four slots Monday to Friday and two on Saturday per semester. Periods
/// count up across the whole week, so they are unique within every day.
fn push_timetable(
    timetable: &mut Timetable,
    semester: &SemesterFixture,
    first_course: usize,
    period: &mut u64,
) {
    for (d, day) in Day::ALL.iter().take(6).enumerate() {
        let slots = if *day == Day::Saturday { 2 } else { 4 };
        for (s, (start, end)) in SLOT_TIMES.iter().take(slots).enumerate() {
            let course_idx = (d + s) % COURSES_PER_SEMESTER;
            timetable.day_mut(*day).push(TimetableSlot {
                period: *period,
                course_id: (first_course + course_idx).to_string(),
                start_time: start.to_string(),
                end_time: end.to_string(),
                venue: format!("{}{}", semester.room_prefix, 101 + course_idx),
                extra: Default::default(),
            });
            *period += 1;
        }
    }
}
