//! Error types for the system sync crate.

use thiserror::Error;

/// Result type alias for system sync operations.
pub type Result<T> = std::result::Result<T, SystemSyncError>;

/// Errors that can occur during system sync operations.
#[derive(Debug, Error)]
pub enum SystemSyncError {
    /// Required URL, credential or connection string is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// External dump tool exited non-zero or timed out
    #[error("Database dump failed: {0}")]
    Dump(String),

    /// External restore tool exited non-zero or timed out
    #[error("Database restore failed: {0}")]
    Restore(String),

    /// Archive construction failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Push transfer rejected by the target deployment
    #[error("Transfer rejected ({status}): {body}")]
    Transfer { status: u16, body: String },

    /// Export fetch rejected by the source deployment
    #[error("Export fetch failed ({status}): {body}")]
    Fetch { status: u16, body: String },

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Admin settings store error
    #[error("Settings error: {0}")]
    Settings(#[from] palanque_core::settings::SettingsError),
}

impl SystemSyncError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a dump failure
    pub fn dump(message: impl Into<String>) -> Self {
        Self::Dump(message.into())
    }

    /// Create a restore failure
    pub fn restore(message: impl Into<String>) -> Self {
        Self::Restore(message.into())
    }

    /// Create an archive failure
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive(message.into())
    }

    /// Create a transfer failure from remote status and body
    pub fn transfer(status: u16, body: impl Into<String>) -> Self {
        Self::Transfer {
            status,
            body: body.into(),
        }
    }

    /// Create a fetch failure from remote status and body
    pub fn fetch(status: u16, body: impl Into<String>) -> Self {
        Self::Fetch {
            status,
            body: body.into(),
        }
    }

    /// Remote HTTP status if this is a transfer or fetch failure.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transfer { status, .. } | Self::Fetch { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for SystemSyncError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}
