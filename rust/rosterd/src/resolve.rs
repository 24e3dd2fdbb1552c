use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::model::{
    validate_score, Assignment, AssignmentCategory, AttendanceRecord, AttendanceStatus, Grade,
    SchoolClass, Student, DEFAULT_MAX_SCORE,
};
use crate::store::{RecordStore, StoreResult};

/// Result of a find-or-create call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upserted<R> {
    pub record: R,
    pub created: bool,
}

/// Natural key of a grade: one score per student per assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeKey {
    pub student_id: i64,
    pub assignment_id: i64,
}

/// Natural key of an attendance mark: one status per student, class and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceKey {
    pub student_id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
}

/// Overwrites the score of the grade matching `key`, or creates it.
///
/// New grades copy maxScore and category from `assignment` when the caller has
/// it, falling back to 100 / homework. The date is stamped with `today`.
pub fn upsert_grade(
    grades: &mut dyn RecordStore<Grade>,
    key: GradeKey,
    score: f64,
    assignment: Option<&Assignment>,
    today: NaiveDate,
) -> StoreResult<Upserted<Grade>> {
    validate_score(score)?;

    let existing = grades.find_first(&|g: &Grade| {
        g.student_id == key.student_id && g.assignment_id == key.assignment_id
    })?;
    if let Some(mut grade) = existing {
        grade.score = score;
        let record = grades.save(grade)?;
        return Ok(Upserted {
            record,
            created: false,
        });
    }

    let (max_score, category) = match assignment {
        Some(a) => (a.max_score, a.category),
        None => (DEFAULT_MAX_SCORE, AssignmentCategory::Homework),
    };
    let record = grades.create(Grade {
        id: 0,
        student_id: key.student_id,
        assignment_id: key.assignment_id,
        score,
        max_score,
        date: today,
        category,
    })?;
    log::debug!(
        "created grade {} for student {} assignment {}",
        record.id,
        key.student_id,
        key.assignment_id
    );
    Ok(Upserted {
        record,
        created: true,
    })
}

/// Sets status and notes on the attendance record matching `key`, or creates it.
/// Missing notes are stored as an empty string.
pub fn mark_attendance(
    attendance: &mut dyn RecordStore<AttendanceRecord>,
    key: AttendanceKey,
    status: AttendanceStatus,
    notes: Option<String>,
) -> StoreResult<Upserted<AttendanceRecord>> {
    let notes = notes.unwrap_or_default();
    let existing = attendance.find_first(&|a: &AttendanceRecord| {
        a.student_id == key.student_id && a.class_id == key.class_id && a.date == key.date
    })?;
    if let Some(mut record) = existing {
        record.status = status;
        record.notes = notes;
        let record = attendance.save(record)?;
        return Ok(Upserted {
            record,
            created: false,
        });
    }

    let record = attendance.create(AttendanceRecord {
        id: 0,
        student_id: key.student_id,
        class_id: key.class_id,
        date: key.date,
        status,
        notes,
    })?;
    Ok(Upserted {
        record,
        created: true,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub class: SchoolClass,
    pub changed: bool,
}

/// Adds `student_id` to the class roster. Enrolling twice is a no-op.
pub fn enroll_student(
    classes: &mut dyn RecordStore<SchoolClass>,
    students: &dyn RecordStore<Student>,
    class_id: i64,
    student_id: i64,
) -> StoreResult<Enrollment> {
    let mut class = classes.get(class_id)?;
    students.get(student_id)?;
    if !class.student_ids.insert(student_id) {
        return Ok(Enrollment {
            class,
            changed: false,
        });
    }
    let class = classes.save(class)?;
    Ok(Enrollment {
        class,
        changed: true,
    })
}

/// Removes `student_id` from the class roster. The student record itself may
/// already be gone.
pub fn withdraw_student(
    classes: &mut dyn RecordStore<SchoolClass>,
    class_id: i64,
    student_id: i64,
) -> StoreResult<Enrollment> {
    let mut class = classes.get(class_id)?;
    if !class.student_ids.remove(&student_id) {
        return Ok(Enrollment {
            class,
            changed: false,
        });
    }
    let class = classes.save(class)?;
    Ok(Enrollment {
        class,
        changed: true,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRemoval {
    pub student: Student,
    pub grades_removed: usize,
    pub attendance_removed: usize,
    pub classes_updated: usize,
}

/// Deletes a student. Without `cascade` their grades, attendance and class
/// enrollments are left in place as orphans.
pub fn delete_student(dataset: &mut Dataset, id: i64, cascade: bool) -> StoreResult<StudentRemoval> {
    dataset.atomically(|ds| remove_student(ds, id, cascade))
}

fn remove_student(dataset: &mut Dataset, id: i64, cascade: bool) -> StoreResult<StudentRemoval> {
    let student = dataset.students.delete(id)?;
    let mut removal = StudentRemoval {
        student,
        grades_removed: 0,
        attendance_removed: 0,
        classes_updated: 0,
    };
    if !cascade {
        return Ok(removal);
    }

    for grade in dataset.grades.list()? {
        if grade.student_id == id {
            dataset.grades.delete(grade.id)?;
            removal.grades_removed += 1;
        }
    }
    for record in dataset.attendance.list()? {
        if record.student_id == id {
            dataset.attendance.delete(record.id)?;
            removal.attendance_removed += 1;
        }
    }
    for mut class in dataset.classes.list()? {
        if class.student_ids.remove(&id) {
            dataset.classes.save(class)?;
            removal.classes_updated += 1;
        }
    }
    log::info!(
        "cascade delete of student {}: {} grades, {} attendance, {} classes",
        id,
        removal.grades_removed,
        removal.attendance_removed,
        removal.classes_updated
    );
    Ok(removal)
}
