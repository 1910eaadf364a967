//! Key-value persistence port.
//!
//! Every collection lives under one string key as a JSON blob, the same
//! layout the browser pages kept in local storage. Typed records are decoded
//! here; a blob that does not decode is reported as corrupt rather than
//! silently replaced.

use crate::db;
use crate::error::{Result, RollcallError};
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub mod keys {
    pub const STUDENTS: &str = "students";
    pub const CLASSES: &str = "classes";
    pub const COURSES: &str = "courses";
    pub const STUDENT_ATTENDANCE: &str = "studentAttendance";
    pub const STUDENT_PICTURES: &str = "studentPictures";
    pub const INSTRUCTORS: &str = "instructors";
    pub const INSTRUCTOR_PICTURES: &str = "instructorPictures";
    pub const INSTRUCTOR_ATTENDANCE: &str = "instructorAttendance";

    pub const ALL: [&str; 8] = [
        STUDENTS,
        CLASSES,
        COURSES,
        STUDENT_ATTENDANCE,
        STUDENT_PICTURES,
        INSTRUCTORS,
        INSTRUCTOR_PICTURES,
        INSTRUCTOR_ATTENDANCE,
    ];
}

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn save(&mut self, key: &str, value: &str) -> Result<()>;

    /// Writes `default` only when `key` has never been saved.
    fn init(&mut self, key: &str, default: &str) -> Result<bool> {
        if self.get(key)?.is_some() {
            return Ok(false);
        }
        self.save(key, default)?;
        Ok(true)
    }
}

/// Decodes the blob under `key`, or `T::default()` when the key is unset.
pub fn load<T, S>(store: &S, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(&raw).map_err(|source| RollcallError::CorruptStore {
                key: key.to_string(),
                source,
            })
        }
        _ => Ok(T::default()),
    }
}

pub fn persist<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| RollcallError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.save(key, &raw)
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        Ok(SqliteStore {
            conn: db::open_db(workspace)?,
        })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |r| {
                r.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO kv_store(key, value, updated_at)
             VALUES(?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            (key, value, &now),
        )?;
        log::debug!("saved {} ({} bytes)", key, value.len());
        Ok(())
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) entries: std::collections::BTreeMap<String, String>,
    /// Keys whose next save fails, for exercising write-failure paths.
    pub fail_saves: Vec<String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_saves.iter().any(|k| k == key) {
            return Err(RollcallError::Db(rusqlite::Error::QueryReturnedNoRows));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_only_writes_missing_keys() {
        let mut store = MemoryStore::default();
        assert!(store.init(keys::STUDENTS, "[]").expect("init"));
        store.save(keys::STUDENTS, "[1]").expect("save");
        assert!(!store.init(keys::STUDENTS, "[]").expect("init again"));
        assert_eq!(store.get(keys::STUDENTS).expect("get").as_deref(), Some("[1]"));
    }

    #[test]
    fn corrupt_blob_is_reported_with_its_key() {
        let mut store = MemoryStore::default();
        store.save(keys::CLASSES, "{not json").expect("save");
        let err = load::<Vec<crate::model::Class>, _>(&store, keys::CLASSES)
            .expect_err("corrupt blob");
        assert_eq!(err.code(), "corrupt_store");
        assert!(err.to_string().contains("classes"));
    }
}
