use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::profile::{NewProfile, ServerProfile};

/// Errors from profile storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A profile with this label already exists; the stored record is
    /// unchanged.
    #[error("label '{0}' is already in use")]
    DuplicateLabel(String),

    /// No profile with this label exists.
    #[error("no profile with label '{0}'")]
    NotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid store path: {0}")]
    Path(String),
}

/// Durable label → credentials mapping over a single SQLite file.
///
/// The path is an explicit constructor argument so tests can point the store
/// at a temporary file; `default_path` gives the conventional per-user
/// location.
pub struct ProfileStore {
    conn: Connection,
}

impl ProfileStore {
    /// Open (or create) the store at `path` and ensure the schema exists.
    /// Safe to call on every startup.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Path(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        debug!("Opening profile store at {}", path.display());
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// `~/.local/share/sshbook/servers.db` on Linux, the platform
    /// equivalents elsewhere.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let proj = ProjectDirs::from("", "", "sshbook")
            .ok_or_else(|| StoreError::Path("unable to locate a user data directory".into()))?;
        Ok(proj.data_dir().join("servers.db"))
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS servers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ip TEXT NOT NULL,
                username TEXT NOT NULL,
                password TEXT NOT NULL,
                label TEXT NOT NULL UNIQUE
            )",
            [],
        )?;
        Ok(())
    }

    /// Insert a new profile. Fails with `DuplicateLabel` when the label is
    /// already taken, leaving the existing record untouched.
    pub fn add_profile(&self, new: NewProfile) -> Result<ServerProfile, StoreError> {
        let result = self.conn.execute(
            "INSERT INTO servers (ip, username, password, label) VALUES (?1, ?2, ?3, ?4)",
            params![new.ip, new.username, new.password, new.label],
        );
        match result {
            Ok(_) => Ok(ServerProfile {
                id: self.conn.last_insert_rowid(),
                ip: new.ip,
                username: new.username,
                password: new.password,
                label: new.label,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateLabel(new.label))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up the profile stored under `label`.
    pub fn find_by_label(&self, label: &str) -> Result<ServerProfile, StoreError> {
        self.conn
            .query_row(
                "SELECT id, ip, username, password, label FROM servers WHERE label = ?1",
                params![label],
                row_to_profile,
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(label.to_string()))
    }

    /// All stored profiles, in insertion order.
    pub fn list_all(&self) -> Result<Vec<ServerProfile>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, ip, username, password, label FROM servers")?;
        let rows = stmt.query_map([], row_to_profile)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn row_to_profile(row: &Row<'_>) -> rusqlite::Result<ServerProfile> {
    Ok(ServerProfile {
        id: row.get(0)?,
        ip: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        label: row.get(4)?,
    })
}
