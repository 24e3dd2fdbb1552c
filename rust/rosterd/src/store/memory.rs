use std::collections::BTreeMap;

use super::{next_id, Record, RecordStore, StoreError, StoreResult};

/// In-process collection used as the mock data layer and in tests.
#[derive(Debug, Clone)]
pub struct MemoryStore<R> {
    records: BTreeMap<i64, R>,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Record> RecordStore<R> for MemoryStore<R> {
    fn list(&self) -> StoreResult<Vec<R>> {
        Ok(self.records.values().cloned().collect())
    }

    fn get(&self, id: i64) -> StoreResult<R> {
        self.records
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found::<R>(id))
    }

    fn create(&mut self, mut draft: R) -> StoreResult<R> {
        draft.validate()?;
        self.ensure_key_free(&draft, None)?;
        let id = next_id(self.records.keys().copied());
        draft.set_id(id);
        self.records.insert(id, draft.clone());
        Ok(draft)
    }

    fn save(&mut self, record: R) -> StoreResult<R> {
        if !self.records.contains_key(&record.id()) {
            return Err(StoreError::not_found::<R>(record.id()));
        }
        record.validate()?;
        self.ensure_key_free(&record, Some(record.id()))?;
        self.records.insert(record.id(), record.clone());
        Ok(record)
    }

    fn delete(&mut self, id: i64) -> StoreResult<R> {
        self.records
            .remove(&id)
            .ok_or_else(|| StoreError::not_found::<R>(id))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttendanceRecord, AttendanceStatus};
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use serde_json::json;

    fn record(student_id: i64) -> AttendanceRecord {
        AttendanceRecord {
            id: 0,
            student_id,
            class_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 9, 3).expect("date"),
            status: AttendanceStatus::Present,
            notes: String::new(),
        }
    }

    #[test]
    fn create_assigns_max_plus_one() {
        let mut store = MemoryStore::new();
        assert_eq!(store.create(record(1)).expect("create").id, 1);
        assert_eq!(store.create(record(2)).expect("create").id, 2);
        store.delete(1).expect("delete");
        assert_eq!(store.create(record(3)).expect("create").id, 3);
    }

    #[test]
    fn draft_identifier_is_ignored() {
        let mut store = MemoryStore::new();
        let mut draft = record(1);
        draft.id = 42;
        assert_eq!(store.create(draft).expect("create").id, 1);
    }

    #[test]
    fn update_missing_id_is_not_found_and_leaves_collection_alone() {
        let mut store = MemoryStore::new();
        store.create(record(1)).expect("create");
        let before = store.list().expect("list");
        let res = store.update(9, &json!({ "status": "late" }));
        assert!(matches!(
            res,
            Err(StoreError::NotFound {
                kind: "attendance",
                id: 9
            })
        ));
        assert_eq!(store.list().expect("list"), before);
    }

    #[test]
    fn failed_patch_leaves_record_untouched() {
        let mut store = MemoryStore::new();
        let created = store.create(record(1)).expect("create");
        assert!(store.update(created.id, &json!({ "status": "asleep" })).is_err());
        assert_eq!(store.get(created.id).expect("get"), created);
    }

    #[test]
    fn update_merges_and_delete_returns_removed_record() {
        let mut store = MemoryStore::new();
        let created = store.create(record(1)).expect("create");
        let updated = store
            .update(created.id, &json!({ "status": "late", "notes": "bus" }))
            .expect("update");
        assert_eq!(updated.status, AttendanceStatus::Late);
        assert_eq!(updated.notes, "bus");
        assert_eq!(updated.student_id, 1);

        let removed = store.delete(created.id).expect("delete");
        assert_eq!(removed, updated);
        assert!(matches!(store.delete(created.id), Err(StoreError::NotFound { .. })));
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn natural_key_is_unique_on_create_and_update() {
        let mut store = MemoryStore::<AttendanceRecord>::new();
        let first = store.create(record(1)).expect("create");
        assert!(matches!(
            store.create(record(1)),
            Err(StoreError::Duplicate {
                kind: "attendance",
                existing
            }) if existing == first.id
        ));

        let other = store.create(record(2)).expect("create");
        assert!(matches!(
            store.update(other.id, &json!({ "studentId": 1 })),
            Err(StoreError::Duplicate { .. })
        ));
        assert_eq!(store.get(other.id).expect("get").student_id, 2);

        // Saving a record over its own key is fine.
        let moved = store
            .update(other.id, &json!({ "status": "late" }))
            .expect("update");
        assert_eq!(moved.status, AttendanceStatus::Late);
        assert_eq!(store.count().expect("count"), 2);
    }

    proptest! {
        #[test]
        fn created_ids_exceed_every_live_id(ops in prop::collection::vec(any::<bool>(), 1..64)) {
            let mut store = MemoryStore::<AttendanceRecord>::new();
            for (n, create) in ops.into_iter().enumerate() {
                let live: Vec<i64> = store.list().unwrap().iter().map(|r| r.id).collect();
                if create || live.is_empty() {
                    let created = store.create(record(n as i64)).unwrap();
                    prop_assert!(created.id >= 1);
                    prop_assert!(live.iter().all(|id| created.id > *id));
                } else {
                    store.delete(live[n % live.len()]).unwrap();
                }
            }
        }

        #[test]
        fn create_only_sequences_are_strictly_increasing(count in 1usize..50) {
            let mut store = MemoryStore::<AttendanceRecord>::new();
            let mut last = 0;
            for n in 0..count {
                let id = store.create(record(n as i64)).unwrap().id;
                prop_assert!(id > last);
                last = id;
            }
        }
    }
}
