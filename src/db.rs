use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Persistent set of hidden story ids.
///
/// One-way by design: ids are added when the user hides a story and never
/// removed. The pagination layer snapshots the set before dispatching a
/// batch so hidden stories are never fetched or rendered again.
pub struct HiddenStore {
    conn: Arc<Mutex<Connection>>,
}

impl HiddenStore {
    pub fn open_default() -> Result<Self> {
        let app_data_dir = Self::app_data_dir()?;
        if !app_data_dir.exists() {
            std::fs::create_dir_all(&app_data_dir)?;
        }
        Self::open(app_data_dir.join("hidden.db"))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS hidden (
                id INTEGER PRIMARY KEY,
                hidden_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn app_data_dir() -> Result<PathBuf> {
        let home_dir =
            dirs_next::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home_dir.join(".hn_reader"))
    }

    /// Mark a story as hidden. Idempotent.
    pub fn hide(&self, id: u64) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Failed to lock database connection"))?;
        conn.execute(
            "INSERT OR IGNORE INTO hidden (id, hidden_at) VALUES (?1, ?2)",
            params![id as i64, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn is_hidden(&self, id: u64) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Failed to lock database connection"))?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM hidden WHERE id = ?1",
            params![id as i64],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All hidden ids, read at batch-dispatch time.
    pub fn snapshot(&self) -> Result<HashSet<u64>> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("Failed to lock database connection"))?;
        let mut stmt = conn.prepare("SELECT id FROM hidden")?;
        let ids_iter = stmt.query_map([], |row| row.get::<_, i64>(0))?;

        let mut ids = HashSet::new();
        for id in ids_iter {
            ids.insert(id? as u64);
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hide_and_lookup() {
        let store = HiddenStore::open_in_memory().unwrap();
        assert!(!store.is_hidden(42).unwrap());
        store.hide(42).unwrap();
        assert!(store.is_hidden(42).unwrap());
        assert!(!store.is_hidden(43).unwrap());
    }

    #[test]
    fn hide_is_idempotent() {
        let store = HiddenStore::open_in_memory().unwrap();
        store.hide(7).unwrap();
        store.hide(7).unwrap();
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn snapshot_contains_all_hidden_ids() {
        let store = HiddenStore::open_in_memory().unwrap();
        for id in [1u64, 2, 3] {
            store.hide(id).unwrap();
        }
        let snap = store.snapshot().unwrap();
        assert_eq!(snap, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn hidden_ids_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hidden.db");

        let store = HiddenStore::open(&path).unwrap();
        store.hide(99).unwrap();
        drop(store);

        let reopened = HiddenStore::open(&path).unwrap();
        assert!(reopened.is_hidden(99).unwrap());
    }
}
