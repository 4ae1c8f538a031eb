//! SQLite-backed stores.

use chrono::{DateTime, Utc};
use core_types::{Role, SCHEMA_VERSION, Snapshot, SnapshotRecord, UserProfile};
use rusqlite::{Connection, OptionalExtension, Result as SqlResult, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::{
    Result, RoleStore, SnapshotStore, StoreError, UserProfileStore, key_time, next_key, parse_key,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    key INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    html TEXT NOT NULL,
    css TEXT NOT NULL,
    js TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    uid TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS roles (
    uid TEXT PRIMARY KEY,
    role TEXT NOT NULL
);
"#;

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    debug!(path = %path.display(), "opened database");
    Ok(conn)
}

fn open_memory_connection() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    // Store schema version
    conn.execute(
        "INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?1)",
        params![SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

fn read_schema_version(conn: &Connection) -> Result<u32> {
    let version: String = conn.query_row(
        "SELECT value FROM schema_info WHERE key = 'version'",
        [],
        |row| row.get(0),
    )?;
    Ok(version.parse().unwrap_or(0))
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| StoreError::Poisoned)
}

/// SQLite-backed storage for saved projects.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_connection(path)?),
        })
    }

    /// A private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_memory_connection()?),
        })
    }

    /// Get the current schema version.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = lock(&self.conn)?;
        read_schema_version(&conn)
    }

    fn row_to_snapshot(row: &rusqlite::Row) -> SqlResult<Snapshot> {
        let key: i64 = row.get(0)?;
        Ok(Snapshot {
            key: key.to_string(),
            record: SnapshotRecord {
                title: row.get(1)?,
                html: row.get(2)?,
                css: row.get(3)?,
                js: row.get(4)?,
            },
            created_at: key_time(key),
        })
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save(&self, record: &SnapshotRecord) -> Result<Snapshot> {
        let conn = lock(&self.conn)?;

        let last: Option<i64> = conn.query_row("SELECT MAX(key) FROM snapshots", [], |row| {
            row.get(0)
        })?;
        let key = next_key(Utc::now(), last);

        conn.execute(
            "INSERT INTO snapshots (key, title, html, css, js) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![key, record.title, record.html, record.css, record.js],
        )?;
        info!(key, title = %record.title, "saved snapshot");

        Ok(Snapshot {
            key: key.to_string(),
            record: record.clone(),
            created_at: key_time(key),
        })
    }

    fn get(&self, key: &str) -> Result<Option<Snapshot>> {
        let Some(key) = parse_key(key) else {
            return Ok(None);
        };

        let conn = lock(&self.conn)?;
        let snapshot = conn
            .query_row(
                "SELECT key, title, html, css, js FROM snapshots WHERE key = ?1",
                params![key],
                Self::row_to_snapshot,
            )
            .optional()?;

        Ok(snapshot)
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<Snapshot>> {
        let conn = lock(&self.conn)?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map(|n| n as i64).unwrap_or(-1);

        let mut stmt = conn.prepare(
            "SELECT key, title, html, css, js FROM snapshots ORDER BY key DESC LIMIT ?1",
        )?;
        let snapshots = stmt
            .query_map(params![limit], Self::row_to_snapshot)?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(snapshots)
    }

    fn count(&self) -> Result<usize> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// SQLite-backed profiles and roles.
pub struct SqliteAccountStore {
    conn: Mutex<Connection>,
}

impl SqliteAccountStore {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_connection(path)?),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(open_memory_connection()?),
        })
    }
}

impl UserProfileStore for SqliteAccountStore {
    fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO profiles (uid, display_name, email, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                profile.uid,
                profile.display_name,
                profile.email,
                profile.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let conn = lock(&self.conn)?;
        let row = conn
            .query_row(
                "SELECT uid, display_name, email, created_at FROM profiles WHERE uid = ?1",
                params![uid],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((uid, display_name, email, created_at)) = row else {
            return Ok(None);
        };

        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Corrupt {
                key: uid.clone(),
                reason: e.to_string(),
            })?;

        Ok(Some(UserProfile {
            uid,
            display_name,
            email,
            created_at,
        }))
    }
}

impl RoleStore for SqliteAccountStore {
    fn set_role(&self, uid: &str, role: Role) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT OR REPLACE INTO roles (uid, role) VALUES (?1, ?2)",
            params![uid, role.to_string()],
        )?;
        Ok(())
    }

    fn role(&self, uid: &str) -> Result<Option<Role>> {
        let conn = lock(&self.conn)?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT role FROM roles WHERE uid = ?1",
                params![uid],
                |row| row.get(0),
            )
            .optional()?;

        stored
            .map(|value| {
                value.parse().map_err(|reason| StoreError::Corrupt {
                    key: uid.to_string(),
                    reason,
                })
            })
            .transpose()
    }
}
