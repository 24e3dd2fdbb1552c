use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::model::{
    Assignment, AssignmentCategory, AttendanceRecord, AttendanceStatus, Grade, SchoolClass,
    Student, StudentStatus,
};

pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// `score / max * 100`, or `None` when the scale is unusable.
pub fn percent(score: f64, max_score: f64) -> Option<f64> {
    if !max_score.is_finite() || max_score <= 0.0 || !score.is_finite() {
        return None;
    }
    Some(score / max_score * 100.0)
}

/// Mean of the per-grade percentages, rounded to the nearest integer.
/// Grades with a non-positive maxScore are skipped.
pub fn average_percent<'a, I>(grades: I) -> Option<i64>
where
    I: IntoIterator<Item = &'a Grade>,
{
    let mut sum = 0.0;
    let mut n: usize = 0;
    for g in grades {
        if let Some(p) = percent(g.score, g.max_score) {
            sum += p;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    Some((sum / n as f64).round() as i64)
}

pub fn student_average(grades: &[Grade], student_id: i64) -> Option<i64> {
    average_percent(grades.iter().filter(|g| g.student_id == student_id))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceStats {
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub total: usize,
}

pub fn tally_attendance<'a, I>(records: I) -> AttendanceStats
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut stats = AttendanceStats::default();
    for r in records {
        match r.status {
            AttendanceStatus::Present => stats.present += 1,
            AttendanceStatus::Absent => stats.absent += 1,
            AttendanceStatus::Late => stats.late += 1,
        }
        stats.total += 1;
    }
    stats
}

pub fn daily_attendance_stats(records: &[AttendanceRecord], date: NaiveDate) -> AttendanceStats {
    tally_attendance(records.iter().filter(|r| r.date == date))
}

/// Whole-number share of present marks; 0 when nothing was recorded.
pub fn attendance_rate(stats: &AttendanceStats) -> i64 {
    if stats.total == 0 {
        return 0;
    }
    (stats.present as f64 / stats.total as f64 * 100.0).round() as i64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

pub fn letter_grade(percent: f64) -> LetterGrade {
    if percent >= 90.0 {
        LetterGrade::A
    } else if percent >= 80.0 {
        LetterGrade::B
    } else if percent >= 70.0 {
        LetterGrade::C
    } else if percent >= 60.0 {
        LetterGrade::D
    } else {
        LetterGrade::F
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    #[serde(rename = "F")]
    pub f: usize,
}

impl GradeDistribution {
    fn add(&mut self, letter: LetterGrade) {
        match letter {
            LetterGrade::A => self.a += 1,
            LetterGrade::B => self.b += 1,
            LetterGrade::C => self.c += 1,
            LetterGrade::D => self.d += 1,
            LetterGrade::F => self.f += 1,
        }
    }
}

/// Buckets each student by the letter of their overall average. Students with
/// no usable grades are left out.
pub fn grade_distribution(students: &[Student], grades: &[Grade]) -> GradeDistribution {
    let mut dist = GradeDistribution::default();
    for s in students {
        if let Some(avg) = student_average(grades, s.id) {
            dist.add(letter_grade(avg as f64));
        }
    }
    dist
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Grade,
    Attendance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub kind: ActivityKind,
    pub record_id: i64,
    pub description: String,
    pub date: NaiveDate,
}

/// Newest-first merge of the latest grades and attendance marks.
pub fn recent_activity(
    grades: &[Grade],
    attendance: &[AttendanceRecord],
    assignments: &[Assignment],
    limit: usize,
) -> Vec<Activity> {
    let names: HashMap<i64, &str> = assignments.iter().map(|a| (a.id, a.name.as_str())).collect();
    let mut out: Vec<Activity> = Vec::new();
    for g in grades.iter().skip(grades.len().saturating_sub(limit)) {
        let label = names
            .get(&g.assignment_id)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("assignment #{}", g.assignment_id));
        out.push(Activity {
            kind: ActivityKind::Grade,
            record_id: g.id,
            description: format!("Grade updated: {}", label),
            date: g.date,
        });
    }
    for r in attendance.iter().skip(attendance.len().saturating_sub(limit)) {
        out.push(Activity {
            kind: ActivityKind::Attendance,
            record_id: r.id,
            description: format!("Attendance marked: {}", r.status.as_str()),
            date: r.date,
        });
    }
    // Stable: ties keep grades ahead of attendance and insertion order within each.
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out.truncate(limit);
    out
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: usize,
    pub total_classes: usize,
    pub active_students: usize,
    pub today: NaiveDate,
    pub today_attendance: AttendanceStats,
    pub attendance_rate: i64,
    pub recent_activity: Vec<Activity>,
    pub grade_distribution: GradeDistribution,
}

pub struct Snapshot<'a> {
    pub students: &'a [Student],
    pub classes: &'a [SchoolClass],
    pub assignments: &'a [Assignment],
    pub grades: &'a [Grade],
    pub attendance: &'a [AttendanceRecord],
}

pub fn dashboard_summary(snap: &Snapshot<'_>, today: NaiveDate) -> DashboardSummary {
    let today_attendance = daily_attendance_stats(snap.attendance, today);
    DashboardSummary {
        total_students: snap.students.len(),
        total_classes: snap.classes.len(),
        active_students: snap
            .students
            .iter()
            .filter(|s| s.status == StudentStatus::Active)
            .count(),
        today,
        today_attendance,
        attendance_rate: attendance_rate(&today_attendance),
        recent_activity: recent_activity(
            snap.grades,
            snap.attendance,
            snap.assignments,
            RECENT_ACTIVITY_LIMIT,
        ),
        grade_distribution: grade_distribution(snap.students, snap.grades),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub assignment_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_id: Option<i64>,
    pub score: Option<f64>,
    pub max_score: f64,
    pub letter: Option<LetterGrade>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub student_id: i64,
    pub display_name: String,
    pub cells: Vec<GridCell>,
    pub average: Option<i64>,
    pub letter: Option<LetterGrade>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeGrid {
    pub class_id: i64,
    pub assignments: Vec<Assignment>,
    pub rows: Vec<GridRow>,
}

/// Grade-entry grid for a class: one row per enrolled student that still
/// exists, one cell per assignment of the class. Row averages only cover the
/// class's own assignments.
pub fn class_grade_grid(
    class: &SchoolClass,
    students: &[Student],
    assignments: &[Assignment],
    grades: &[Grade],
    category: Option<AssignmentCategory>,
) -> GradeGrid {
    let columns: Vec<Assignment> = assignments
        .iter()
        .filter(|a| a.class_id == class.id)
        .filter(|a| category.map_or(true, |c| a.category == c))
        .cloned()
        .collect();
    let by_key: HashMap<(i64, i64), &Grade> = grades
        .iter()
        .map(|g| ((g.student_id, g.assignment_id), g))
        .collect();

    let mut roster: Vec<&Student> = students
        .iter()
        .filter(|s| class.student_ids.contains(&s.id))
        .collect();
    roster.sort_by(|a, b| {
        a.last_name
            .cmp(&b.last_name)
            .then_with(|| a.first_name.cmp(&b.first_name))
            .then(a.id.cmp(&b.id))
    });

    let rows = roster
        .into_iter()
        .map(|s| {
            let mut row_grades: Vec<&Grade> = Vec::new();
            let cells = columns
                .iter()
                .map(|a| {
                    let g = by_key.get(&(s.id, a.id)).copied();
                    if let Some(g) = g {
                        row_grades.push(g);
                    }
                    GridCell {
                        assignment_id: a.id,
                        grade_id: g.map(|g| g.id),
                        score: g.map(|g| g.score),
                        max_score: g.map_or(a.max_score, |g| g.max_score),
                        letter: g
                            .and_then(|g| percent(g.score, g.max_score))
                            .map(letter_grade),
                    }
                })
                .collect();
            let average = average_percent(row_grades.iter().copied());
            GridRow {
                student_id: s.id,
                display_name: s.display_name(),
                cells,
                average,
                letter: average.map(|v| letter_grade(v as f64)),
            }
        })
        .collect();

    GradeGrid {
        class_id: class.id,
        assignments: columns,
        rows,
    }
}
