//! Persistent storage for the Hello World playground.
//!
//! This crate provides:
//! - SnapshotStore: saved projects keyed by a timestamp identifier
//! - UserProfileStore / RoleStore: the account records the hosted
//!   backend keeps for each learner
//!
//! Each trait has a SQLite implementation and an in-memory one.

mod memory;
mod sqlite;

pub use memory::{MemoryAccountStore, MemorySnapshotStore};
pub use sqlite::{SqliteAccountStore, SqliteSnapshotStore};

use chrono::{DateTime, TimeZone, Utc};
use core_types::{Role, Snapshot, SnapshotRecord, UserProfile};
use std::io::Write;
use thiserror::Error;

/// Errors from the store crate.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Keyed storage of saved projects.
///
/// Keys are epoch milliseconds rendered as decimal strings. A store never
/// reuses a key and never overwrites an existing record.
pub trait SnapshotStore: Send + Sync {
    /// Write a record under a fresh key.
    fn save(&self, record: &SnapshotRecord) -> Result<Snapshot>;

    /// Look up a record; unknown or malformed keys give `None`.
    fn get(&self, key: &str) -> Result<Option<Snapshot>>;

    /// Saved records, newest first.
    fn list(&self, limit: Option<usize>) -> Result<Vec<Snapshot>>;

    fn count(&self) -> Result<usize>;

    /// The most recently saved record.
    fn latest(&self) -> Result<Option<Snapshot>> {
        Ok(self.list(Some(1))?.into_iter().next())
    }

    /// Write every snapshot, oldest first, as one JSON object per line.
    fn export_jsonl(&self, writer: &mut dyn Write) -> Result<usize> {
        let mut snapshots = self.list(None)?;
        snapshots.reverse();

        for snapshot in &snapshots {
            let json = serde_json::to_string(snapshot)?;
            writeln!(writer, "{json}")?;
        }
        writer.flush()?;
        Ok(snapshots.len())
    }
}

/// Profiles of signed-in users.
pub trait UserProfileStore: Send + Sync {
    /// Insert or replace a profile.
    fn put_profile(&self, profile: &UserProfile) -> Result<()>;

    fn profile(&self, uid: &str) -> Result<Option<UserProfile>>;
}

/// Which users are teachers and which are students.
pub trait RoleStore: Send + Sync {
    fn set_role(&self, uid: &str, role: Role) -> Result<()>;

    fn role(&self, uid: &str) -> Result<Option<Role>>;
}

/// Choose the key for a new snapshot.
///
/// Uses the current time unless that would not be strictly greater than
/// the last key handed out.
pub(crate) fn next_key(now: DateTime<Utc>, last: Option<i64>) -> i64 {
    let millis = now.timestamp_millis();
    match last {
        Some(last) if last >= millis => last + 1,
        _ => millis,
    }
}

/// Creation time encoded in a snapshot key.
pub(crate) fn key_time(key: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(key)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

pub(crate) fn parse_key(key: &str) -> Option<i64> {
    key.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_key_uses_clock() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        assert_eq!(next_key(now, None), 1_700_000_000_000);
        assert_eq!(next_key(now, Some(1_600_000_000_000)), 1_700_000_000_000);
    }

    #[test]
    fn test_next_key_never_repeats() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        assert_eq!(next_key(now, Some(1_700_000_000_000)), 1_700_000_000_001);
        // Clock went backwards
        assert_eq!(next_key(now, Some(1_800_000_000_000)), 1_800_000_000_001);
    }

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("1700000000000"), Some(1_700_000_000_000));
        assert_eq!(parse_key("not-a-key"), None);
    }

    #[test]
    fn test_key_time_round_trips_millis() {
        let time = key_time(1_700_000_000_123);

        assert_eq!(time.timestamp_millis(), 1_700_000_000_123);
    }
}
