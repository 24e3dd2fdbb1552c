use rusqlite::{Connection, OptionalExtension};
use std::marker::PhantomData;
use std::rc::Rc;

use super::{Record, RecordStore, StoreError, StoreResult};

/// Workspace-backed collection. Each record is one row of `R::TABLE` holding
/// its JSON document; the table layout is created by `db::open_db`.
pub struct SqliteStore<R> {
    conn: Rc<Connection>,
    _record: PhantomData<R>,
}

impl<R: Record> SqliteStore<R> {
    pub fn new(conn: Rc<Connection>) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }

    fn decode(body: &str) -> StoreResult<R> {
        Ok(serde_json::from_str(body)?)
    }
}

impl<R: Record> RecordStore<R> for SqliteStore<R> {
    fn list(&self) -> StoreResult<Vec<R>> {
        let sql = format!("SELECT body FROM {} ORDER BY id", R::TABLE);
        let mut stmt = self.conn.prepare(&sql)?;
        let bodies = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        bodies.iter().map(|b| Self::decode(b)).collect()
    }

    fn get(&self, id: i64) -> StoreResult<R> {
        let sql = format!("SELECT body FROM {} WHERE id = ?", R::TABLE);
        let body: Option<String> = self
            .conn
            .query_row(&sql, [id], |r| r.get(0))
            .optional()?;
        match body {
            Some(b) => Self::decode(&b),
            None => Err(StoreError::not_found::<R>(id)),
        }
    }

    fn create(&mut self, mut draft: R) -> StoreResult<R> {
        draft.validate()?;
        // A dataset-wide transaction may already be open.
        let tx = if self.conn.is_autocommit() {
            Some(self.conn.unchecked_transaction()?)
        } else {
            None
        };
        self.ensure_key_free(&draft, None)?;
        let id: i64 = self.conn.query_row(
            &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {}", R::TABLE),
            [],
            |r| r.get(0),
        )?;
        draft.set_id(id);
        let body = serde_json::to_string(&draft)?;
        self.conn.execute(
            &format!("INSERT INTO {}(id, body) VALUES(?, ?)", R::TABLE),
            (id, &body),
        )?;
        if let Some(tx) = tx {
            tx.commit()?;
        }
        Ok(draft)
    }

    fn save(&mut self, record: R) -> StoreResult<R> {
        record.validate()?;
        self.ensure_key_free(&record, Some(record.id()))?;
        let body = serde_json::to_string(&record)?;
        let changed = self.conn.execute(
            &format!("UPDATE {} SET body = ? WHERE id = ?", R::TABLE),
            (&body, record.id()),
        )?;
        if changed == 0 {
            return Err(StoreError::not_found::<R>(record.id()));
        }
        Ok(record)
    }

    fn delete(&mut self, id: i64) -> StoreResult<R> {
        let existing = self.get(id)?;
        self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?", R::TABLE),
            [id],
        )?;
        Ok(existing)
    }

    fn count(&self) -> StoreResult<usize> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", R::TABLE),
            [],
            |r| r.get(0),
        )?;
        Ok(n.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::model::{Assignment, AssignmentCategory, Grade};
    use chrono::NaiveDate;
    use serde_json::json;

    fn store() -> SqliteStore<Assignment> {
        let conn = Connection::open_in_memory().expect("open sqlite");
        db::ensure_schema(&conn).expect("schema");
        SqliteStore::new(Rc::new(conn))
    }

    fn assignment(name: &str) -> Assignment {
        Assignment {
            id: 0,
            name: name.to_string(),
            category: AssignmentCategory::Quiz,
            max_score: 20.0,
            class_id: 1,
            date: None,
        }
    }

    #[test]
    fn crud_roundtrip_through_json_rows() {
        let mut s = store();
        let a = s.create(assignment("Quiz 1")).expect("create");
        let b = s.create(assignment("Quiz 2")).expect("create");
        assert_eq!((a.id, b.id), (1, 2));

        let updated = s
            .update(a.id, &json!({ "maxScore": 25.0 }))
            .expect("update");
        assert_eq!(updated.max_score, 25.0);
        assert_eq!(s.get(a.id).expect("get").max_score, 25.0);

        let names: Vec<String> = s.list().expect("list").into_iter().map(|x| x.name).collect();
        assert_eq!(names, vec!["Quiz 1", "Quiz 2"]);

        s.delete(b.id).expect("delete");
        assert_eq!(s.count().expect("count"), 1);
        assert_eq!(s.create(assignment("Quiz 3")).expect("create").id, 2);
    }

    #[test]
    fn missing_rows_are_not_found() {
        let mut s = store();
        assert!(matches!(s.get(5), Err(StoreError::NotFound { kind: "assignment", id: 5 })));
        assert!(matches!(
            s.update(5, &json!({ "name": "x" })),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(s.delete(5), Err(StoreError::NotFound { .. })));
        assert_eq!(s.count().expect("count"), 0);
    }

    #[test]
    fn grade_key_collisions_are_rejected() {
        let conn = Connection::open_in_memory().expect("open sqlite");
        db::ensure_schema(&conn).expect("schema");
        let mut grades: SqliteStore<Grade> = SqliteStore::new(Rc::new(conn));
        let grade = |assignment_id: i64| Grade {
            id: 0,
            student_id: 1,
            assignment_id,
            score: 50.0,
            max_score: 100.0,
            date: NaiveDate::from_ymd_opt(2024, 9, 3).expect("date"),
            category: AssignmentCategory::Quiz,
        };
        grades.create(grade(1)).expect("create");
        assert!(matches!(
            grades.create(grade(1)),
            Err(StoreError::Duplicate { kind: "grade", existing: 1 })
        ));
        let second = grades.create(grade(2)).expect("create");
        assert!(matches!(
            grades.update(second.id, &json!({ "assignmentId": 1 })),
            Err(StoreError::Duplicate { .. })
        ));
        assert_eq!(grades.count().expect("count"), 2);
    }

    #[test]
    fn invalid_drafts_are_not_written() {
        let mut s = store();
        let mut bad = assignment("Broken");
        bad.max_score = 0.0;
        assert!(matches!(s.create(bad), Err(StoreError::Validation { .. })));
        assert_eq!(s.count().expect("count"), 0);
    }
}
