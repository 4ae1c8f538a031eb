//! In-memory stores for tests and guest sessions.

use chrono::Utc;
use core_types::{Role, Snapshot, SnapshotRecord, UserProfile};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::{
    Result, RoleStore, SnapshotStore, StoreError, UserProfileStore, key_time, next_key, parse_key,
};

/// Snapshot store that forgets everything when dropped.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<BTreeMap<i64, SnapshotRecord>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, record: &SnapshotRecord) -> Result<Snapshot> {
        let mut snapshots = self.snapshots.write().map_err(|_| StoreError::Poisoned)?;
        let last = snapshots.keys().next_back().copied();
        let key = next_key(Utc::now(), last);
        snapshots.insert(key, record.clone());

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
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;

        Ok(snapshots.get(&key).map(|record| Snapshot {
            key: key.to_string(),
            record: record.clone(),
            created_at: key_time(key),
        }))
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<Snapshot>> {
        let snapshots = self.snapshots.read().map_err(|_| StoreError::Poisoned)?;

        Ok(snapshots
            .iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(key, record)| Snapshot {
                key: key.to_string(),
                record: record.clone(),
                created_at: key_time(*key),
            })
            .collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self
            .snapshots
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .len())
    }
}

/// Profiles and roles held in memory.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
    roles: RwLock<HashMap<String, Role>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserProfileStore for MemoryAccountStore {
    fn put_profile(&self, profile: &UserProfile) -> Result<()> {
        self.profiles
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    fn profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .profiles
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .get(uid)
            .cloned())
    }
}

impl RoleStore for MemoryAccountStore {
    fn set_role(&self, uid: &str, role: Role) -> Result<()> {
        self.roles
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .insert(uid.to_string(), role);
        Ok(())
    }

    fn role(&self, uid: &str) -> Result<Option<Role>> {
        Ok(self
            .roles
            .read()
            .map_err(|_| StoreError::Poisoned)?
            .get(uid)
            .copied())
    }
}
