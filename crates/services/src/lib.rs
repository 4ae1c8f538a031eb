//! External collaborators of the playground.
//!
//! [`ExternalServices`] is built once from a [`ServicesConfig`] and passed
//! to whatever needs it. It bundles the snapshot store, the account
//! records, the learning content and the sandbox setup.

pub mod config;
pub mod logging;

pub use config::{BoundaryKind, ServicesConfig};

use content::{ContentProvider, StaticContentProvider};
use core_types::{Identity, Role, UserProfile};
use sandbox::{ExecutionBoundary, FrameBoundary, HeadlessBoundary, SandboxPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use store::{
    MemoryAccountStore, MemorySnapshotStore, RoleStore, SnapshotStore, SqliteAccountStore,
    SqliteSnapshotStore, UserProfileStore,
};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the services crate.
#[derive(Error, Debug)]
pub enum ServicesError {
    #[error("Cannot read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Content error: {0}")]
    Content(#[from] content::ContentError),

    #[error("Sandbox error: {0}")]
    Sandbox(#[from] sandbox::SandboxError),
}

/// Result type for services operations.
pub type Result<T> = std::result::Result<T, ServicesError>;

/// Handle to everything outside the editor core.
#[derive(Clone)]
pub struct ExternalServices {
    config: ServicesConfig,
    snapshots: Arc<dyn SnapshotStore>,
    profiles: Arc<dyn UserProfileStore>,
    roles: Arc<dyn RoleStore>,
    content: Arc<dyn ContentProvider>,
}

impl ExternalServices {
    /// Open the on-disk database and load content as configured.
    pub fn connect(config: ServicesConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;
        let path = config.database_path();

        let snapshots = Arc::new(SqliteSnapshotStore::open(&path)?);
        let accounts = Arc::new(SqliteAccountStore::open(&path)?);
        let content = Arc::new(load_content(&config)?);
        info!(database = %path.display(), "connected services");

        Ok(Self {
            config,
            snapshots,
            profiles: accounts.clone(),
            roles: accounts,
            content,
        })
    }

    /// Services that keep everything in memory.
    pub fn in_memory(config: ServicesConfig) -> Result<Self> {
        let accounts = Arc::new(MemoryAccountStore::new());
        let content = Arc::new(load_content(&config)?);

        Ok(Self {
            config,
            snapshots: Arc::new(MemorySnapshotStore::new()),
            profiles: accounts.clone(),
            roles: accounts,
            content,
        })
    }

    pub fn config(&self) -> &ServicesConfig {
        &self.config
    }

    pub fn snapshots(&self) -> &dyn SnapshotStore {
        self.snapshots.as_ref()
    }

    pub fn profiles(&self) -> &dyn UserProfileStore {
        self.profiles.as_ref()
    }

    pub fn roles(&self) -> &dyn RoleStore {
        self.roles.as_ref()
    }

    pub fn content(&self) -> &dyn ContentProvider {
        self.content.as_ref()
    }

    /// Resolve who is using the editor.
    ///
    /// No uid, or a uid with no profile, is a guest.
    pub fn identify(&self, uid: Option<&str>) -> Result<Identity> {
        let Some(uid) = uid.map(str::trim).filter(|uid| !uid.is_empty()) else {
            return Ok(Identity::Guest);
        };

        match self.profiles.profile(uid)? {
            Some(profile) => Ok(profile.identity()),
            None => {
                debug!(uid, "no profile, treating as guest");
                Ok(Identity::Guest)
            }
        }
    }

    /// Role of a signed-in user; unknown users are students.
    pub fn role_of(&self, uid: &str) -> Result<Role> {
        Ok(self.roles.role(uid)?.unwrap_or(Role::Student))
    }

    /// Create or update a profile and its role.
    pub fn register(&self, profile: &UserProfile, role: Role) -> Result<()> {
        self.profiles.put_profile(profile)?;
        self.roles.set_role(&profile.uid, role)?;
        info!(uid = %profile.uid, %role, "registered profile");
        Ok(())
    }

    /// Capability policy for preview documents.
    pub fn sandbox_policy(&self) -> Result<SandboxPolicy> {
        self.config.sandbox.policy()
    }

    /// The configured execution boundary.
    pub fn execution_boundary(&self) -> Arc<dyn ExecutionBoundary> {
        match self.config.sandbox.boundary {
            BoundaryKind::Frame => Arc::new(FrameBoundary::new()),
            BoundaryKind::Headless => {
                Arc::new(HeadlessBoundary::new(self.config.sandbox.headless.clone()))
            }
        }
    }
}

fn load_content(config: &ServicesConfig) -> Result<StaticContentProvider> {
    Ok(match &config.content_file {
        Some(path) => StaticContentProvider::from_file(path)?,
        None => StaticContentProvider::builtin()?,
    })
}
