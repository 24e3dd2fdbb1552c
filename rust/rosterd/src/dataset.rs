use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::db;
use crate::model::{Assignment, AttendanceRecord, Grade, SchoolClass, Student};
use crate::store::{MemoryStore, RecordStore, SqliteStore, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite { workspace: PathBuf },
}

impl Backend {
    pub fn label(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Sqlite { .. } => "sqlite",
        }
    }
}

/// The one authoritative copy of every collection.
///
/// `revision` moves forward once per successful mutation; callers compare it
/// against the revision of their last read and refetch when it differs.
pub struct Dataset {
    pub students: Box<dyn RecordStore<Student>>,
    pub classes: Box<dyn RecordStore<SchoolClass>>,
    pub assignments: Box<dyn RecordStore<Assignment>>,
    pub grades: Box<dyn RecordStore<Grade>>,
    pub attendance: Box<dyn RecordStore<AttendanceRecord>>,
    backend: Backend,
    conn: Option<Rc<Connection>>,
    revision: u64,
}

impl Dataset {
    pub fn in_memory() -> Self {
        Self {
            students: Box::new(MemoryStore::<Student>::new()),
            classes: Box::new(MemoryStore::<SchoolClass>::new()),
            assignments: Box::new(MemoryStore::<Assignment>::new()),
            grades: Box::new(MemoryStore::<Grade>::new()),
            attendance: Box::new(MemoryStore::<AttendanceRecord>::new()),
            backend: Backend::Memory,
            conn: None,
            revision: 0,
        }
    }

    pub fn open_workspace(workspace: &Path) -> anyhow::Result<Self> {
        let conn = db::open_db(workspace)?;
        Ok(Self::on_connection(
            conn,
            Backend::Sqlite {
                workspace: workspace.to_path_buf(),
            },
        ))
    }

    fn on_connection(conn: Connection, backend: Backend) -> Self {
        let conn = Rc::new(conn);
        Self {
            students: Box::new(SqliteStore::<Student>::new(conn.clone())),
            classes: Box::new(SqliteStore::<SchoolClass>::new(conn.clone())),
            assignments: Box::new(SqliteStore::<Assignment>::new(conn.clone())),
            grades: Box::new(SqliteStore::<Grade>::new(conn.clone())),
            attendance: Box::new(SqliteStore::<AttendanceRecord>::new(conn.clone())),
            backend,
            conn: Some(conn),
            revision: 0,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Records that a mutation went through and returns the new revision.
    pub fn touch(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Continues the revision sequence of the dataset this one replaces, so a
    /// workspace switch never hands out a revision a caller has already seen.
    pub fn succeed(&mut self, previous: u64) -> u64 {
        self.revision = self.revision.max(previous) + 1;
        self.revision
    }

    /// Runs a multi-store mutation as one unit.
    ///
    /// On SQLite the whole operation shares one transaction and an error rolls
    /// every store back. The memory backend cannot roll back, so an error there
    /// bumps the revision instead and callers refetch whatever was written.
    pub fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut Dataset) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let Some(conn) = self.conn.clone() else {
            let out = op(self);
            if out.is_err() {
                self.touch();
            }
            return out;
        };
        let tx = conn.unchecked_transaction()?;
        let out = op(self)?;
        tx.commit()?;
        Ok(out)
    }
}
