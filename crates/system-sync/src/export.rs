//! Export packager (pull-sync source side).

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::Utc;
use log::info;
use palanque_core::settings::SettingsStore;

use crate::archive::build_code_archive;
use crate::config::{DatabaseConfig, EnvSnapshot};
use crate::error::Result;
use crate::package::{CODE_ENTRY_NAME, DUMP_ENTRY_NAME};
use crate::tools::DatabaseTools;
use crate::types::{ExportMetadata, ExportPackage, SYNC_PACKAGE_VERSION, SYNC_SOURCE};
use crate::workspace::SyncWorkspace;

/// Produce the in-memory export bundle served by the export endpoint.
///
/// Runs the dump and code archive against a private workspace, encodes both
/// outputs, snapshots the allow-listed environment values and reads the raw
/// admin settings file. The caller is an external HTTP handler that MUST
/// authenticate the request before invoking this: the bundle contains
/// plaintext secret values and a full code+data snapshot.
pub async fn generate_export_package(
    database: &DatabaseConfig,
    tools: &dyn DatabaseTools,
    env: &EnvSnapshot,
    settings: &SettingsStore,
) -> Result<ExportPackage> {
    let database_url = database.require_url()?;
    let workspace = SyncWorkspace::create()?;

    let dump_path = workspace.join(DUMP_ENTRY_NAME);
    tools.produce_dump(database_url, &dump_path).await?;
    let dump_bytes = std::fs::read(&dump_path)?;

    let archive_path = workspace.join(CODE_ENTRY_NAME);
    build_code_archive(settings.root(), &archive_path)?;
    let code_bytes = std::fs::read(&archive_path)?;

    let admin_config = settings.read_raw()?;

    info!(
        "[SystemSync] Export package assembled (dump={} bytes, code={} bytes, admin_config={})",
        dump_bytes.len(),
        code_bytes.len(),
        admin_config.is_some()
    );

    Ok(ExportPackage {
        database: Some(BASE64_STANDARD.encode(&dump_bytes)),
        code: Some(BASE64_STANDARD.encode(&code_bytes)),
        env_vars: env.to_map(),
        admin_config,
        metadata: Some(ExportMetadata {
            version: SYNC_PACKAGE_VERSION.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            source: SYNC_SOURCE.to_string(),
            database_size: dump_bytes.len() as u64,
            code_size: code_bytes.len() as u64,
        }),
    })
}
