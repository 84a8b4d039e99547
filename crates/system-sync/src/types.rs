//! Wire and result types for system sync operations.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fixed source label identifying packages produced by this platform.
pub const SYNC_SOURCE: &str = "palanque";

/// Package format version written into every manifest.
pub const SYNC_PACKAGE_VERSION: &str = "1.0";

/// Path of the export endpoint, relative to a deployment's base URL.
pub const EXPORT_ENDPOINT_PATH: &str = "/api/admin/system-sync/export";

/// Compute a `sha256:<hex>` checksum over a byte payload.
pub fn sha256_checksum(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("sha256:{:x}", hasher.finalize())
}

/// Manifest written as the `metadata.json` entry of a sync package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub version: String,
    pub timestamp: String,
    pub source: String,
    pub includes_database: bool,
    pub includes_code: bool,
}

impl PackageManifest {
    pub fn new(includes_database: bool, includes_code: bool) -> Self {
        Self {
            version: SYNC_PACKAGE_VERSION.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            source: SYNC_SOURCE.to_string(),
            includes_database,
            includes_code,
        }
    }
}

/// Metadata attached to an [`ExportPackage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub version: String,
    pub timestamp: String,
    pub source: String,
    pub database_size: u64,
    pub code_size: u64,
}

/// Full-deployment export bundle served by the export endpoint.
///
/// Every field is optional on the wire: a peer treats a missing field as
/// "nothing to do" for that field rather than an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportPackage {
    /// Base64-encoded SQL dump bytes.
    pub database: Option<String>,
    /// Base64-encoded code archive bytes.
    pub code: Option<String>,
    /// Allow-listed environment values currently set on the source.
    pub env_vars: BTreeMap<String, Option<String>>,
    /// Raw admin settings file contents, `None` when the source has none.
    pub admin_config: Option<String>,
    pub metadata: Option<ExportMetadata>,
}

/// JSON body POSTed to the push transfer endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEnvelope {
    /// Base64-encoded package zip.
    pub package: String,
    pub timestamp: String,
    pub metadata: PushMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMetadata {
    /// Decoded package size in bytes.
    pub size: u64,
    pub encoding: String,
    pub checksum: String,
}

impl PushEnvelope {
    /// Wrap raw package bytes for transfer.
    pub fn for_package(package_bytes: &[u8]) -> Self {
        Self {
            package: BASE64_STANDARD.encode(package_bytes),
            timestamp: Utc::now().to_rfc3339(),
            metadata: PushMetadata {
                size: package_bytes.len() as u64,
                encoding: "base64".to_string(),
                checksum: sha256_checksum(package_bytes),
            },
        }
    }
}

/// Outcome of one push sync operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub error: Option<String>,
    pub details: Option<SyncDetails>,
}

impl SyncResult {
    pub fn ok(message: impl Into<String>, details: SyncDetails) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            error: None,
            details: Some(details),
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            error: Some(error.into()),
            details: None,
        }
    }
}

/// What actually happened during a push sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncDetails {
    pub package_bytes: u64,
    pub dump_bytes: Option<u64>,
    pub code_bytes: Option<u64>,
    pub includes_database: bool,
    pub includes_code: bool,
    pub duration_ms: i64,
}

/// Outcome of one import operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub error: Option<String>,
    pub details: Option<ImportDetails>,
}

impl ImportResult {
    pub fn ok(message: impl Into<String>, details: ImportDetails) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            error: None,
            details: Some(details),
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
            error: Some(error.into()),
            details: None,
        }
    }
}

/// Per-step outcomes of an import. Sub-step failures are recorded here
/// instead of failing the whole operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDetails {
    pub database_restored: bool,
    /// Received code payloads are never applied locally; always false.
    pub code_extracted: bool,
    pub admin_config_written: bool,
    /// Names (never values) of allow-listed variables set on the source
    /// but absent locally; the operator applies these manually.
    pub env_vars_to_update: Vec<String>,
    pub dump_bytes: Option<u64>,
    pub duration_ms: i64,
}
