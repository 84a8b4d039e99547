//! Admin settings file model and store.
//!
//! Administrative settings live in a single JSON file under the deployment
//! root. The sync subsystem transfers the file as an opaque string, so the
//! store exposes raw read/overwrite next to the typed model used by the
//! rest of the platform.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of the admin settings file, relative to the deployment root.
pub const ADMIN_SETTINGS_RELATIVE_PATH: &str = "config/admin-settings.json";

/// Result type alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors raised by the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Filesystem error while reading or writing the settings file
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file contents are not valid JSON
    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Feature switches toggled per deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlags {
    #[serde(default)]
    pub polling: bool,
    #[serde(default)]
    pub ai_messaging: bool,
    #[serde(default)]
    pub sales_tracking: bool,
}

/// Administrative settings for one campaign deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSettings {
    pub candidate_name: Option<String>,
    pub candidate_number: Option<u32>,
    pub party: Option<String>,
    pub office_sought: Option<String>,
    pub election_year: Option<i32>,
    pub timezone: Option<String>,
    #[serde(default)]
    pub features: FeatureFlags,
}

impl AdminSettings {
    /// Parse settings from raw file contents.
    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Serialize settings to the on-disk JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// File-backed store for the admin settings of one deployment.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    root: PathBuf,
}

impl SettingsStore {
    /// Create a store rooted at the given deployment directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Deployment root this store resolves paths against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the settings file.
    pub fn file_path(&self) -> PathBuf {
        self.root.join(ADMIN_SETTINGS_RELATIVE_PATH)
    }

    /// Read the raw settings file contents, `None` when the file does not exist.
    pub fn read_raw(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(self.file_path()) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Overwrite the settings file with raw contents, creating parent
    /// directories as needed. Last writer wins.
    pub fn write_raw(&self, contents: &str) -> Result<()> {
        let path = self.file_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(())
    }

    /// Read and parse the typed settings model, `None` when the file is absent.
    pub fn read(&self) -> Result<Option<AdminSettings>> {
        match self.read_raw()? {
            Some(raw) => Ok(Some(AdminSettings::parse(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialize and persist the typed settings model.
    pub fn write(&self, settings: &AdminSettings) -> Result<()> {
        self.write_raw(&settings.to_json()?)
    }
}
