use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::store::{Record, StoreError};

pub const DEFAULT_TERM: &str = "Fall 2024";
pub const DEFAULT_MAX_SCORE: f64 = 100.0;
pub const DEFAULT_GRADE_LEVEL: u8 = 9;

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn default_term() -> String {
    DEFAULT_TERM.to_string()
}

fn default_max_score() -> f64 {
    DEFAULT_MAX_SCORE
}

fn default_grade_level() -> u8 {
    DEFAULT_GRADE_LEVEL
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Graduated,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Graduated => "graduated",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Some(StudentStatus::Active),
            "inactive" => Some(StudentStatus::Inactive),
            "graduated" => Some(StudentStatus::Graduated),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentCategory {
    #[default]
    Homework,
    Quiz,
    Exam,
    Project,
    Participation,
}

impl AssignmentCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "homework" => Some(AssignmentCategory::Homework),
            "quiz" => Some(AssignmentCategory::Quiz),
            "exam" => Some(AssignmentCategory::Exam),
            "project" => Some(AssignmentCategory::Project),
            "participation" => Some(AssignmentCategory::Participation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "present" => Some(AttendanceStatus::Present),
            "absent" => Some(AttendanceStatus::Absent),
            "late" => Some(AttendanceStatus::Late),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// External student code printed on school records, not the store identifier.
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default = "today")]
    pub enrollment_date: NaiveDate,
    #[serde(default = "default_grade_level")]
    pub grade_level: u8,
    #[serde(default)]
    pub status: StudentStatus,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub room: String,
    #[serde(default = "default_term")]
    pub term: String,
    #[serde(default)]
    pub student_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: AssignmentCategory,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default)]
    pub class_id: i64,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grade {
    #[serde(default)]
    pub id: i64,
    pub student_id: i64,
    pub assignment_id: i64,
    pub score: f64,
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    #[serde(default = "today")]
    pub date: NaiveDate,
    #[serde(default)]
    pub category: AssignmentCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default)]
    pub id: i64,
    pub student_id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: String,
}

fn require_text(field: &str, value: &str, label: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(field, format!("{label} is required")));
    }
    Ok(())
}

/// Same shape the enrollment form accepted: `local@domain.tld`, no whitespace.
pub fn looks_like_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

impl Record for Student {
    const KIND: &'static str = "student";
    const TABLE: &'static str = "students";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), StoreError> {
        require_text("firstName", &self.first_name, "First name")?;
        require_text("lastName", &self.last_name, "Last name")?;
        require_text("email", &self.email, "Email")?;
        require_text("studentId", &self.student_id, "Student ID")?;
        if self.date_of_birth.is_none() {
            return Err(StoreError::validation(
                "dateOfBirth",
                "Date of birth is required",
            ));
        }
        if !looks_like_email(self.email.trim()) {
            return Err(StoreError::validation(
                "email",
                "Please enter a valid email address",
            ));
        }
        if !(9..=12).contains(&self.grade_level) {
            return Err(StoreError::validation(
                "gradeLevel",
                "grade level must be between 9 and 12",
            ));
        }
        Ok(())
    }
}

impl Record for SchoolClass {
    const KIND: &'static str = "class";
    const TABLE: &'static str = "classes";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), StoreError> {
        require_text("name", &self.name, "Class name")?;
        require_text("subject", &self.subject, "Subject")?;
        require_text("period", &self.period, "Period")?;
        require_text("room", &self.room, "Room")?;
        Ok(())
    }
}

impl Record for Assignment {
    const KIND: &'static str = "assignment";
    const TABLE: &'static str = "assignments";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), StoreError> {
        require_text("name", &self.name, "Assignment name")?;
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            return Err(StoreError::validation(
                "maxScore",
                "maxScore must be a positive number",
            ));
        }
        Ok(())
    }
}

impl Record for Grade {
    const KIND: &'static str = "grade";
    const TABLE: &'static str = "grades";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn validate(&self) -> Result<(), StoreError> {
        validate_score(self.score)?;
        if !self.max_score.is_finite() || self.max_score <= 0.0 {
            return Err(StoreError::validation(
                "maxScore",
                "maxScore must be a positive number",
            ));
        }
        Ok(())
    }

    /// One grade per student per assignment.
    fn same_key(&self, other: &Self) -> bool {
        self.student_id == other.student_id && self.assignment_id == other.assignment_id
    }
}

/// Scores are not checked against maxScore here; extra credit is allowed.
pub fn validate_score(score: f64) -> Result<(), StoreError> {
    if !score.is_finite() || score < 0.0 {
        return Err(StoreError::validation(
            "score",
            "score must be a non-negative number",
        ));
    }
    Ok(())
}

impl Record for AttendanceRecord {
    const KIND: &'static str = "attendance";
    const TABLE: &'static str = "attendance";

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn same_key(&self, other: &Self) -> bool {
        self.student_id == other.student_id
            && self.class_id == other.class_id
            && self.date == other.date
    }
}
