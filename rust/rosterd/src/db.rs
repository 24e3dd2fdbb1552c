use anyhow::bail;
use rusqlite::Connection;
use std::path::Path;

use crate::model::{Assignment, AttendanceRecord, Grade, SchoolClass, Student};
use crate::store::Record;

pub const DB_FILE_NAME: &str = "roster.sqlite3";
pub const SCHEMA_VERSION: i64 = 1;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;

    let version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if version > SCHEMA_VERSION {
        bail!(
            "workspace schema version {} is newer than supported version {}",
            version,
            SCHEMA_VERSION
        );
    }

    ensure_schema(&conn)?;
    Ok(conn)
}

pub fn ensure_schema(conn: &Connection) -> anyhow::Result<()> {
    for table in [
        Student::TABLE,
        SchoolClass::TABLE,
        Assignment::TABLE,
        Grade::TABLE,
        AttendanceRecord::TABLE,
    ] {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {}(
                    id INTEGER PRIMARY KEY,
                    body TEXT NOT NULL
                )",
                table
            ),
            [],
        )?;
    }
    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
    Ok(())
}
