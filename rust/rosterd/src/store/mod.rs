mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A record kept in a [`RecordStore`], keyed by a store-assigned positive integer.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Singular name used in error messages ("student", "grade", ...).
    const KIND: &'static str;
    /// Backing table name for the SQLite workspace.
    const TABLE: &'static str;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);

    fn validate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Whether `other` sits on the same natural key. Records without one never
    /// collide.
    fn same_key(&self, _other: &Self) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    #[error("{field}: {message}")]
    Validation { field: String, message: String },
    #[error("{kind} {existing} already holds this key")]
    Duplicate { kind: &'static str, existing: i64 },
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("codec: {0}")]
    Codec(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found<R: Record>(id: i64) -> Self {
        StoreError::NotFound { kind: R::KIND, id }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over one entity collection.
///
/// Backends only provide `list`, `get`, `create`, `save` and `delete`; `update`
/// and `find_first` are layered on top so every backend merges patches the same
/// way.
pub trait RecordStore<R: Record> {
    /// All records in identifier order.
    fn list(&self) -> StoreResult<Vec<R>>;

    fn get(&self, id: i64) -> StoreResult<R>;

    /// Validates `draft`, assigns the next identifier and stores it. Any
    /// identifier already on the draft is ignored.
    fn create(&mut self, draft: R) -> StoreResult<R>;

    /// Replaces the stored record with the same identifier.
    fn save(&mut self, record: R) -> StoreResult<R>;

    fn delete(&mut self, id: i64) -> StoreResult<R>;

    /// Shallow-merges the top-level fields of `patch` onto the stored record.
    fn update(&mut self, id: i64, patch: &Value) -> StoreResult<R> {
        let current = self.get(id)?;
        let merged = merge_patch(&current, patch)?;
        self.save(merged)
    }

    fn find_first(&self, pred: &dyn Fn(&R) -> bool) -> StoreResult<Option<R>> {
        Ok(self.list()?.into_iter().find(|r| pred(r)))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.list()?.len())
    }

    /// Fails with `Duplicate` when a record other than `exclude` already holds
    /// the natural key of `record`.
    fn ensure_key_free(&self, record: &R, exclude: Option<i64>) -> StoreResult<()> {
        let clash = self.find_first(&|r: &R| Some(r.id()) != exclude && r.same_key(record))?;
        match clash {
            Some(existing) => Err(StoreError::Duplicate {
                kind: R::KIND,
                existing: existing.id(),
            }),
            None => Ok(()),
        }
    }
}

/// `max(existing) + 1`, or 1 for an empty collection.
pub fn next_id<I>(ids: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    ids.into_iter().fold(0, i64::max) + 1
}

/// Applies a JSON object patch to `current`. The identifier is never taken from
/// the patch and the merged record must still validate.
pub fn merge_patch<R: Record>(current: &R, patch: &Value) -> StoreResult<R> {
    let Some(fields) = patch.as_object() else {
        return Err(StoreError::validation("patch", "patch must be an object"));
    };
    let mut doc = serde_json::to_value(current)?;
    if let Some(target) = doc.as_object_mut() {
        for (key, value) in fields {
            if key == "id" {
                continue;
            }
            target.insert(key.clone(), value.clone());
        }
    }
    let mut merged: R =
        serde_json::from_value(doc).map_err(|e| StoreError::validation("patch", e.to_string()))?;
    merged.set_id(current.id());
    merged.validate()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SchoolClass, Student};
    use serde_json::json;

    #[test]
    fn next_id_defaults_to_one_and_follows_max() {
        assert_eq!(next_id(Vec::<i64>::new()), 1);
        assert_eq!(next_id(vec![4, 2, 9]), 10);
    }

    #[test]
    fn merge_patch_keeps_identifier_and_untouched_fields() {
        let class: SchoolClass = serde_json::from_value(json!({
            "id": 7,
            "name": "Biology",
            "subject": "Science",
            "period": "2nd",
            "room": "B12",
            "studentIds": [1, 2]
        }))
        .expect("class");
        let merged = merge_patch(&class, &json!({ "id": 99, "room": "B14" })).expect("merge");
        assert_eq!(merged.id, 7);
        assert_eq!(merged.room, "B14");
        assert_eq!(merged.name, "Biology");
        assert_eq!(merged.student_ids.len(), 2);
    }

    #[test]
    fn merge_patch_revalidates() {
        let student: Student = serde_json::from_value(json!({
            "id": 1,
            "firstName": "Grace",
            "lastName": "Hopper",
            "email": "grace@navy.mil",
            "studentId": "S-2",
            "dateOfBirth": "2007-01-02"
        }))
        .expect("student");
        assert!(matches!(
            merge_patch(&student, &json!({ "email": "" })),
            Err(StoreError::Validation { .. })
        ));
        assert!(matches!(
            merge_patch(&student, &json!({ "gradeLevel": "twelve" })),
            Err(StoreError::Validation { .. })
        ));
        assert!(matches!(
            merge_patch(&student, &json!([1, 2])),
            Err(StoreError::Validation { .. })
        ));
    }
}
