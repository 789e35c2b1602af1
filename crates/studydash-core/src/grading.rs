//! Grade-point lookup and credit-weighted GPA/CGPA.
//!
//! Unknown letters and unparsable credits count as zero, so a half-filled
//! grade row never poisons the average.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Grade;

/// Fixed letter → points lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeScale {
    /// S=10, A=9, B=8, C=7, D=6, E=5, F=0.
    #[default]
    TenPoint,
    /// A+/A=4.0 down to D=1.0, F=0.
    FourPoint,
}

impl GradeScale {
    /// Points for a letter grade, `0.0` when the letter is not on the scale.
    pub fn points(&self, letter: &str) -> f64 {
        let letter = letter.trim().to_ascii_uppercase();
        match self {
            GradeScale::TenPoint => match letter.as_str() {
                "S" => 10.0,
                "A" => 9.0,
                "B" => 8.0,
                "C" => 7.0,
                "D" => 6.0,
                "E" => 5.0,
                _ => 0.0,
            },
            GradeScale::FourPoint => match letter.as_str() {
                "A+" | "A" => 4.0,
                "A-" => 3.7,
                "B+" => 3.3,
                "B" => 3.0,
                "B-" => 2.7,
                "C+" => 2.3,
                "C" => 2.0,
                "C-" => 1.7,
                "D+" => 1.3,
                "D" => 1.0,
                _ => 0.0,
            },
        }
    }

    /// Letters accepted by this scale, best first.
    pub fn letters(&self) -> &'static [&'static str] {
        match self {
            GradeScale::TenPoint => &["S", "A", "B", "C", "D", "E", "F"],
            GradeScale::FourPoint => &[
                "A+", "A", "A-", "B+", "B", "B-", "C+", "C", "C-", "D+", "D", "F",
            ],
        }
    }
}

/// String-typed credits as a number; blank or garbage is zero.
pub fn parse_credits(credits: &str) -> f64 {
    credits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|c| c.is_finite() && *c > 0.0)
        .unwrap_or(0.0)
}

/// Result of a GPA computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpaSummary {
    pub gpa: f64,
    pub total_credits: f64,
    pub total_points: f64,
}

impl GpaSummary {
    /// GPA rounded to two decimals for display.
    pub fn display(&self) -> String {
        format!("{:.2}", self.gpa)
    }
}

/// Credit-weighted GPA over `grades`.
pub fn gpa<'a, I>(scale: GradeScale, grades: I) -> GpaSummary
where
    I: IntoIterator<Item = &'a Grade>,
{
    let mut summary = GpaSummary::default();
    for grade in grades {
        let credits = parse_credits(&grade.credits);
        summary.total_points += scale.points(&grade.grade) * credits;
        summary.total_credits += credits;
    }
    if summary.total_credits > 0.0 {
        summary.gpa = summary.total_points / summary.total_credits;
    }
    summary
}

/// Cumulative GPA: each named semester's GPA weighted by its credits.
///
/// Grades with a blank semester name are left out. Returns the summary and
/// the number of distinct semesters counted.
pub fn cgpa<'a, I>(scale: GradeScale, grades: I) -> (GpaSummary, usize)
where
    I: IntoIterator<Item = &'a Grade>,
{
    let mut by_semester: BTreeMap<&str, Vec<&Grade>> = BTreeMap::new();
    for grade in grades {
        let name = grade.semester.trim();
        if !name.is_empty() {
            by_semester.entry(name).or_default().push(grade);
        }
    }

    let mut summary = GpaSummary::default();
    for semester_grades in by_semester.values() {
        let sem = gpa(scale, semester_grades.iter().copied());
        if sem.total_credits > 0.0 {
            summary.total_points += sem.gpa * sem.total_credits;
            summary.total_credits += sem.total_credits;
        }
    }
    if summary.total_credits > 0.0 {
        summary.gpa = summary.total_points / summary.total_credits;
    }
    (summary, by_semester.len())
}
