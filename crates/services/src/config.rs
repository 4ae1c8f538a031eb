//! TOML configuration for the playground.
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! working setup.

use sandbox::{HeadlessConfig, SandboxPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::LogFormat;
use crate::{Result, ServicesError};

/// Default HTTP port of the server.
pub const DEFAULT_PORT: u16 = 5970;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Directory holding the database and exports
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file name, relative to `data_dir`
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Replacement for the built-in content seed
    #[serde(default)]
    pub content_file: Option<PathBuf>,

    #[serde(default)]
    pub sandbox: SandboxSettings,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            content_file: None,
            sandbox: SandboxSettings::default(),
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ServicesConfig {
    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ServicesError::ConfigIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Read a config file if given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ServicesError::ConfigParse(e.to_string()))
    }

    /// Render as TOML, e.g. for `init`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ServicesError::ConfigParse(e.to_string()))
    }

    /// Full path of the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Directory exports are written into.
    pub fn export_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_database_file() -> String {
    "playground.db".to_string()
}

/// Which isolation primitive runs previews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    /// Hand the document to the browser in a sandboxed iframe
    #[default]
    Frame,
    /// Execute scripts server-side in an embedded engine
    Headless,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxSettings {
    #[serde(default)]
    pub boundary: BoundaryKind,

    /// Capability names granted to preview documents, e.g. `["scripts"]`
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,

    #[serde(default)]
    pub headless: HeadlessConfig,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            boundary: BoundaryKind::default(),
            capabilities: default_capabilities(),
            headless: HeadlessConfig::default(),
        }
    }
}

impl SandboxSettings {
    /// Build the policy, rejecting capabilities that would break isolation.
    pub fn policy(&self) -> Result<SandboxPolicy> {
        Ok(SandboxPolicy::from_names(&self.capabilities)?)
    }
}

fn default_capabilities() -> Vec<String> {
    vec!["scripts".to_string()]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory with the built frontend, served at `/`
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Extra origins allowed to call the API cross-origin.
    /// `null` and `*` are ignored.
    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Open editors kept at once; the oldest is closed beyond this
    #[serde(default = "default_max_editors")]
    pub max_editors: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            allowed_origins: Vec::new(),
            max_editors: default_max_editors(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_editors() -> usize {
    256
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub file: Option<PathBuf>,
}
