//! SQLite implementation of [`DatabaseConnector`]
//!
//! Two tables: `tblRoot` (single metadata row) and `tblCons` (node rows).
//! Tables are created when missing.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use crate::connector::{DatabaseConnector, MetadataRecord, RawRow};
use crate::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tblRoot (
    Name        TEXT    NOT NULL,
    Export      INTEGER NOT NULL DEFAULT 0,
    Protected   TEXT    NOT NULL,
    ConfVersion TEXT    NOT NULL,
    LocalCache  INTEGER NOT NULL DEFAULT 1
);
CREATE TABLE IF NOT EXISTS tblCons (
    ConstantID  TEXT    PRIMARY KEY,
    ParentID    TEXT,
    Type        TEXT    NOT NULL,
    Name        TEXT    NOT NULL,
    Position    INTEGER NOT NULL DEFAULT 0,
    Expanded    INTEGER NOT NULL DEFAULT 0,
    Favorite    INTEGER NOT NULL DEFAULT 0,
    Connected   INTEGER NOT NULL DEFAULT 0,
    Payload     TEXT    NOT NULL
);
";

/// Store backed by a SQLite database file
#[derive(Debug)]
pub struct SqliteConnector {
    location: String,
    conn: Mutex<Connection>,
}

impl SqliteConnector {
    /// Open or create a database file
    ///
    /// # Errors
    /// [`StoreError::Unreachable`] if the file cannot be opened
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| unreachable(path, &e))?;
        Self::from_connection(conn, path.display().to_string())
    }

    /// Open an existing database file without creating it
    ///
    /// # Errors
    /// [`StoreError::Unreachable`] if the file does not exist or cannot be opened
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| unreachable(path, &e))?;
        Self::from_connection(conn, path.display().to_string())
    }

    /// Open a private in-memory database
    ///
    /// # Errors
    /// [`StoreError`] if SQLite cannot allocate the database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, ":memory:".to_string())
    }

    fn from_connection(conn: Connection, location: String) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(store = %location, "sqlite store opened");
        Ok(Self {
            location,
            conn: Mutex::new(conn),
        })
    }

    /// Database location, as given when opening
    #[inline]
    #[must_use]
    pub fn location(&self) -> PathBuf {
        PathBuf::from(&self.location)
    }
}

fn unreachable(path: &Path, err: &rusqlite::Error) -> StoreError {
    StoreError::Unreachable(format!("{}: {err}", path.display()))
}

impl DatabaseConnector for SqliteConnector {
    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }

    fn read_metadata(&self) -> Result<Option<MetadataRecord>, StoreError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT Name, Export, Protected, ConfVersion, LocalCache FROM tblRoot LIMIT 1",
                [],
                |row| {
                    Ok(MetadataRecord {
                        name: row.get(0)?,
                        export: row.get(1)?,
                        protected: row.get(2)?,
                        conf_version: row.get(3)?,
                        local_cache: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn write_metadata(&self, record: &MetadataRecord) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tblRoot", [])?;
        tx.execute(
            "INSERT INTO tblRoot (Name, Export, Protected, ConfVersion, LocalCache)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.name,
                record.export,
                record.protected,
                record.conf_version,
                record.local_cache
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn read_rows(&self) -> Result<Vec<RawRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT ConstantID, ParentID, Type, Name, Position, Expanded, Favorite, Connected, Payload
             FROM tblCons ORDER BY Position, rowid",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RawRow {
                    constant_id: row.get(0)?,
                    parent_id: row.get(1)?,
                    node_type: row.get(2)?,
                    name: row.get(3)?,
                    position: row.get(4)?,
                    expanded: row.get(5)?,
                    favorite: row.get(6)?,
                    connected: row.get(7)?,
                    payload: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn replace_rows(&self, rows: &[RawRow]) -> Result<(), StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tblCons", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO tblCons
                 (ConstantID, ParentID, Type, Name, Position, Expanded, Favorite, Connected, Payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.constant_id,
                    row.parent_id,
                    row.node_type,
                    row.name,
                    row.position,
                    row.expanded,
                    row.favorite,
                    row.connected,
                    row.payload
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(store = %self.location, rows = rows.len(), "replaced node rows");
        Ok(())
    }

    fn is_local_cache_enabled(&self) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let enabled: Option<bool> = conn
            .query_row("SELECT LocalCache FROM tblRoot LIMIT 1", [], |row| row.get(0))
            .optional()?;
        Ok(enabled.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record() -> MetadataRecord {
        MetadataRecord {
            name: "Connections".into(),
            export: false,
            protected: "marker".into(),
            conf_version: "2.7".into(),
            local_cache: true,
        }
    }

    fn row(id: &str, parent: Option<&str>, position: i64) -> RawRow {
        RawRow {
            constant_id: id.into(),
            parent_id: parent.map(Into::into),
            node_type: "Connection".into(),
            name: id.into(),
            position,
            expanded: false,
            favorite: true,
            connected: false,
            payload: "p".into(),
        }
    }

    #[test]
    fn fresh_store_has_no_metadata() {
        let store = SqliteConnector::open_in_memory().unwrap();
        assert_eq!(store.read_metadata().unwrap(), None);
        assert!(!store.is_local_cache_enabled().unwrap());
    }

    #[test]
    fn metadata_write_replaces_previous() {
        let store = SqliteConnector::open_in_memory().unwrap();
        store.write_metadata(&record()).unwrap();
        let mut second = record();
        second.local_cache = false;
        second.conf_version = "2.6".into();
        store.write_metadata(&second).unwrap();

        assert_eq!(store.read_metadata().unwrap(), Some(second));
        assert!(!store.is_local_cache_enabled().unwrap());
    }

    #[test]
    fn rows_are_replaced_and_ordered_by_position() {
        let store = SqliteConnector::open_in_memory().unwrap();
        store.replace_rows(&[row("old", None, 0)]).unwrap();
        store
            .replace_rows(&[row("b", Some("r"), 2), row("a", Some("r"), 1)])
            .unwrap();

        let rows = store.read_rows().unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.constant_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(rows[0].parent_id.as_deref(), Some("r"));
        assert!(rows[0].favorite);
    }

    #[test]
    fn file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        SqliteConnector::open(&path)
            .unwrap()
            .write_metadata(&record())
            .unwrap();

        let reopened = SqliteConnector::open_existing(&path).unwrap();
        assert_eq!(reopened.read_metadata().unwrap(), Some(record()));
        assert_eq!(reopened.location(), path);
    }

    #[test]
    fn missing_file_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteConnector::open_existing(dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, StoreError::Unreachable(_)));
    }
}
