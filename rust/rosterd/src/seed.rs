use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::dataset::Dataset;
use crate::model::{
    Assignment, AssignmentCategory, AttendanceStatus, SchoolClass, Student, StudentStatus,
};
use crate::resolve::{self, AttendanceKey, GradeKey};
use crate::store::{StoreError, StoreResult};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub students: usize,
    pub classes: usize,
    pub assignments: usize,
    pub grades: usize,
    pub attendance: usize,
}

const STUDENTS: &[(&str, &str, &str, u8, StudentStatus)] = &[
    ("Emma", "Johnson", "2008-03-15", 11, StudentStatus::Active),
    ("Liam", "Smith", "2009-07-22", 10, StudentStatus::Active),
    ("Olivia", "Brown", "2007-11-02", 12, StudentStatus::Active),
    ("Noah", "Davis", "2010-01-30", 9, StudentStatus::Active),
    ("Ava", "Martinez", "2008-09-12", 11, StudentStatus::Inactive),
    ("Ethan", "Wilson", "2009-05-05", 10, StudentStatus::Active),
    ("Sophia", "Anderson", "2007-04-18", 12, StudentStatus::Graduated),
    ("Mason", "Thomas", "2010-12-09", 9, StudentStatus::Active),
];

const CLASSES: &[(&str, &str, &str, &str)] = &[
    ("Algebra II", "Mathematics", "1st Period", "Room 101"),
    ("English Literature", "English", "2nd Period", "Room 204"),
    ("Chemistry", "Science", "3rd Period", "Lab 3"),
];

const ASSIGNMENTS: &[(usize, &str, AssignmentCategory, f64)] = &[
    (0, "Chapter 3 Homework", AssignmentCategory::Homework, 20.0),
    (0, "Quadratics Quiz", AssignmentCategory::Quiz, 50.0),
    (0, "Midterm Exam", AssignmentCategory::Exam, 100.0),
    (1, "Poetry Essay", AssignmentCategory::Project, 100.0),
    (1, "Class Discussion", AssignmentCategory::Participation, 10.0),
    (2, "Lab Report 1", AssignmentCategory::Project, 40.0),
];

fn parse_day(raw: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| StoreError::validation("date", format!("{raw}: {e}")))
}

/// Loads a small demonstration roster into an empty dataset. Attendance is
/// stamped on the five days ending at `today`.
pub fn load_demo(dataset: &mut Dataset, today: NaiveDate) -> StoreResult<SeedSummary> {
    if dataset.students.count()? > 0 || dataset.classes.count()? > 0 {
        return Err(StoreError::validation(
            "dataset",
            "demo data can only be loaded into an empty dataset",
        ));
    }
    dataset.atomically(|ds| populate(ds, today))
}

fn populate(dataset: &mut Dataset, today: NaiveDate) -> StoreResult<SeedSummary> {
    let mut summary = SeedSummary::default();
    let mut student_ids = Vec::new();
    for (n, (first, last, dob, level, status)) in STUDENTS.iter().enumerate() {
        let s = dataset.students.create(Student {
            id: 0,
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}.{}@school.edu", first.to_lowercase(), last.to_lowercase()),
            student_id: format!("STU{:04}", n + 1),
            date_of_birth: Some(parse_day(dob)?),
            enrollment_date: parse_day("2023-09-01")?,
            grade_level: *level,
            status: *status,
        })?;
        student_ids.push(s.id);
        summary.students += 1;
    }

    let mut class_ids = Vec::new();
    for (n, (name, subject, period, room)) in CLASSES.iter().enumerate() {
        let c = dataset.classes.create(SchoolClass {
            id: 0,
            name: name.to_string(),
            subject: subject.to_string(),
            period: period.to_string(),
            room: room.to_string(),
            term: crate::model::DEFAULT_TERM.to_string(),
            student_ids: Default::default(),
        })?;
        // Spread students across classes; everyone takes at least one.
        for (i, sid) in student_ids.iter().enumerate() {
            if i % CLASSES.len() == n || i % 2 == 0 {
                resolve::enroll_student(
                    dataset.classes.as_mut(),
                    dataset.students.as_ref(),
                    c.id,
                    *sid,
                )?;
            }
        }
        class_ids.push(c.id);
        summary.classes += 1;
    }

    let mut assignments: Vec<Assignment> = Vec::new();
    for (class_idx, name, category, max_score) in ASSIGNMENTS {
        let a = dataset.assignments.create(Assignment {
            id: 0,
            name: name.to_string(),
            category: *category,
            max_score: *max_score,
            class_id: class_ids[*class_idx],
            date: Some(today - Duration::days(14)),
        })?;
        assignments.push(a);
        summary.assignments += 1;
    }

    for a in &assignments {
        let class = dataset.classes.get(a.class_id)?;
        for (i, sid) in class.student_ids.iter().enumerate() {
            // Deterministic spread between 55% and 100% of the scale.
            let share = 0.55 + ((i * 7 + a.id as usize * 3) % 10) as f64 * 0.05;
            let score = (a.max_score * share).round();
            let key = GradeKey {
                student_id: *sid,
                assignment_id: a.id,
            };
            resolve::upsert_grade(
                dataset.grades.as_mut(),
                key,
                score,
                Some(a),
                today - Duration::days(7),
            )?;
            summary.grades += 1;
        }
    }

    for class_id in &class_ids {
        let class = dataset.classes.get(*class_id)?;
        for back in (0..5).rev() {
            let date = today - Duration::days(back);
            for (i, sid) in class.student_ids.iter().enumerate() {
                let status = match (i + back as usize) % 9 {
                    0 => AttendanceStatus::Absent,
                    4 => AttendanceStatus::Late,
                    _ => AttendanceStatus::Present,
                };
                let key = AttendanceKey {
                    student_id: *sid,
                    class_id: *class_id,
                    date,
                };
                resolve::mark_attendance(dataset.attendance.as_mut(), key, status, None)?;
                summary.attendance += 1;
            }
        }
    }

    log::info!(
        "seeded demo data: {} students, {} classes, {} grades, {} attendance",
        summary.students,
        summary.classes,
        summary.grades,
        summary.attendance
    );
    Ok(summary)
}
