use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::{
    Assignment, AssignmentCategory, AttendanceRecord, Grade, SchoolClass, Student, StudentStatus,
};

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Case-insensitive substring match on first name, last name or email.
/// A blank query keeps everything.
pub fn search_students(students: Vec<Student>, query: &str) -> Vec<Student> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return students;
    }
    students
        .into_iter()
        .filter(|s| {
            contains_folded(&s.first_name, &needle)
                || contains_folded(&s.last_name, &needle)
                || contains_folded(&s.email, &needle)
        })
        .collect()
}

pub fn search_classes(classes: Vec<SchoolClass>, query: &str) -> Vec<SchoolClass> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return classes;
    }
    classes
        .into_iter()
        .filter(|c| contains_folded(&c.name, &needle) || contains_folded(&c.subject, &needle))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StudentSortField {
    FirstName,
    #[default]
    LastName,
    Email,
    StudentId,
    GradeLevel,
    EnrollmentDate,
    Status,
}

impl StudentSortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "firstName" => Some(StudentSortField::FirstName),
            "lastName" => Some(StudentSortField::LastName),
            "email" => Some(StudentSortField::Email),
            "studentId" => Some(StudentSortField::StudentId),
            "gradeLevel" => Some(StudentSortField::GradeLevel),
            "enrollmentDate" => Some(StudentSortField::EnrollmentDate),
            "status" => Some(StudentSortField::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Stable sort on one field; equal keys fall back to identifier order.
pub fn sort_students(students: &mut [Student], field: StudentSortField, direction: SortDirection) {
    students.sort_by(|a, b| {
        let ord = match field {
            StudentSortField::FirstName => a.first_name.cmp(&b.first_name),
            StudentSortField::LastName => a.last_name.cmp(&b.last_name),
            StudentSortField::Email => a.email.cmp(&b.email),
            StudentSortField::StudentId => a.student_id.cmp(&b.student_id),
            StudentSortField::GradeLevel => a.grade_level.cmp(&b.grade_level),
            StudentSortField::EnrollmentDate => a.enrollment_date.cmp(&b.enrollment_date),
            StudentSortField::Status => a.status.as_str().cmp(b.status.as_str()),
        };
        let ord = match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord == Ordering::Equal {
            a.id.cmp(&b.id)
        } else {
            ord
        }
    });
}

#[derive(Debug, Clone, Default)]
pub struct StudentFilter {
    pub query: Option<String>,
    pub grade_level: Option<u8>,
    pub status: Option<StudentStatus>,
}

pub fn filter_students(students: Vec<Student>, filter: &StudentFilter) -> Vec<Student> {
    let mut out = match filter.query.as_deref() {
        Some(q) => search_students(students, q),
        None => students,
    };
    if let Some(level) = filter.grade_level {
        out.retain(|s| s.grade_level == level);
    }
    if let Some(status) = filter.status {
        out.retain(|s| s.status == status);
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    pub query: Option<String>,
    pub term: Option<String>,
    pub subject: Option<String>,
}

pub fn filter_classes(classes: Vec<SchoolClass>, filter: &ClassFilter) -> Vec<SchoolClass> {
    let mut out = match filter.query.as_deref() {
        Some(q) => search_classes(classes, q),
        None => classes,
    };
    if let Some(term) = filter.term.as_deref() {
        out.retain(|c| c.term == term);
    }
    if let Some(subject) = filter.subject.as_deref() {
        out.retain(|c| c.subject == subject);
    }
    out
}

pub fn assignments_for_class(
    assignments: Vec<Assignment>,
    class_id: Option<i64>,
    category: Option<AssignmentCategory>,
) -> Vec<Assignment> {
    assignments
        .into_iter()
        .filter(|a| class_id.map_or(true, |id| a.class_id == id))
        .filter(|a| category.map_or(true, |c| a.category == c))
        .collect()
}

/// Grades narrowed by student and/or by class. A grade belongs to a class when
/// its assignment does.
pub fn filter_grades(
    grades: Vec<Grade>,
    assignments: &[Assignment],
    student_id: Option<i64>,
    class_id: Option<i64>,
) -> Vec<Grade> {
    let class_assignments: Option<HashSet<i64>> = class_id.map(|cid| {
        assignments
            .iter()
            .filter(|a| a.class_id == cid)
            .map(|a| a.id)
            .collect()
    });
    grades
        .into_iter()
        .filter(|g| student_id.map_or(true, |id| g.student_id == id))
        .filter(|g| {
            class_assignments
                .as_ref()
                .map_or(true, |ids| ids.contains(&g.assignment_id))
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub date: Option<NaiveDate>,
    /// Inclusive lower bound.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub to: Option<NaiveDate>,
}

pub fn filter_attendance(
    records: Vec<AttendanceRecord>,
    filter: &AttendanceFilter,
) -> Vec<AttendanceRecord> {
    records
        .into_iter()
        .filter(|r| filter.student_id.map_or(true, |id| r.student_id == id))
        .filter(|r| filter.class_id.map_or(true, |id| r.class_id == id))
        .filter(|r| filter.date.map_or(true, |d| r.date == d))
        .filter(|r| filter.from.map_or(true, |d| r.date >= d))
        .filter(|r| filter.to.map_or(true, |d| r.date <= d))
        .collect()
}
