//! Import executor (pull-sync destination side).

use std::time::Instant;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use log::{debug, info, warn};
use palanque_core::settings::SettingsStore;

use crate::client::SystemSyncClient;
use crate::config::{DatabaseConfig, EnvSnapshot, SYNC_ENV_KEYS};
use crate::package::DUMP_ENTRY_NAME;
use crate::tools::DatabaseTools;
use crate::types::{ExportPackage, ImportDetails, ImportResult};
use crate::workspace::SyncWorkspace;

/// Fetch a remote deployment's export bundle and apply it locally.
///
/// The overall result is successful once the fetch and decode succeed;
/// individual sub-steps (restore, admin config write) fail soft and are
/// reported through [`ImportDetails`]. This never returns a raw fault.
pub async fn run_import(
    source_url: &str,
    api_key: &str,
    database: &DatabaseConfig,
    tools: &dyn DatabaseTools,
    env: &EnvSnapshot,
    settings: &SettingsStore,
) -> ImportResult {
    let started_at = Instant::now();
    info!("[SystemSync] Importing system export from {}", source_url);

    let client = SystemSyncClient::new();
    let package = match client.fetch_export(source_url, api_key).await {
        Ok(package) => package,
        Err(err) => {
            warn!("[SystemSync] Export fetch failed: {}", err);
            return ImportResult::failed("Export fetch failed", err.to_string());
        }
    };

    let workspace = match SyncWorkspace::create() {
        Ok(workspace) => workspace,
        Err(err) => {
            warn!("[SystemSync] Workspace creation failed: {}", err);
            return ImportResult::failed("Workspace creation failed", err.to_string());
        }
    };

    let mut details =
        apply_export_package(&package, database, tools, env, settings, &workspace).await;
    details.duration_ms = started_at.elapsed().as_millis() as i64;

    info!(
        "[SystemSync] Import complete (database_restored={}, admin_config_written={}, env_vars_to_update={})",
        details.database_restored,
        details.admin_config_written,
        details.env_vars_to_update.len()
    );
    ImportResult::ok("System import completed", details)
}

/// Apply a decoded export bundle. Missing fields mean "nothing to do";
/// sub-step failures are downgraded to detail flags.
async fn apply_export_package(
    package: &ExportPackage,
    database: &DatabaseConfig,
    tools: &dyn DatabaseTools,
    env: &EnvSnapshot,
    settings: &SettingsStore,
    workspace: &SyncWorkspace,
) -> ImportDetails {
    let mut details = ImportDetails::default();

    if let Some(encoded) = package.database.as_deref() {
        match BASE64_STANDARD.decode(encoded) {
            Ok(dump_bytes) => {
                details.dump_bytes = Some(dump_bytes.len() as u64);
                details.database_restored =
                    restore_database(&dump_bytes, database, tools, workspace).await;
            }
            Err(err) => {
                warn!(
                    "[SystemSync] Received database payload is not valid base64, skipping restore: {}",
                    err
                );
            }
        }
    }

    if let Some(encoded) = package.code.as_deref() {
        // Code payloads travel with the bundle but are never extracted on
        // import; only the push package's install script applies code.
        debug!(
            "[SystemSync] Code payload received ({} encoded bytes), not applied",
            encoded.len()
        );
    }

    if let Some(contents) = package.admin_config.as_deref() {
        match settings.write_raw(contents) {
            Ok(()) => {
                details.admin_config_written = true;
                info!(
                    "[SystemSync] Admin settings overwritten at {}",
                    settings.file_path().display()
                );
            }
            Err(err) => {
                warn!(
                    "[SystemSync] Admin settings write failed (continuing): {}",
                    err
                );
            }
        }
    }

    // Report names only; remote values are never applied to this process.
    for key in SYNC_ENV_KEYS {
        let remote_set = matches!(
            package.env_vars.get(key),
            Some(Some(value)) if !value.trim().is_empty()
        );
        if remote_set && !env.is_set(key) {
            details.env_vars_to_update.push(key.to_string());
        }
    }

    details
}

async fn restore_database(
    dump_bytes: &[u8],
    database: &DatabaseConfig,
    tools: &dyn DatabaseTools,
    workspace: &SyncWorkspace,
) -> bool {
    let dump_path = workspace.join(DUMP_ENTRY_NAME);
    if let Err(err) = std::fs::write(&dump_path, dump_bytes) {
        warn!("[SystemSync] Failed to write received dump: {}", err);
        return false;
    }

    let Some(database_url) = database.url.as_deref() else {
        debug!("[SystemSync] No local DATABASE_URL configured, dump not restored");
        return false;
    };

    match tools.restore_dump(database_url, &dump_path).await {
        Ok(()) => {
            info!(
                "[SystemSync] Database restored from received dump ({} bytes)",
                dump_bytes.len()
            );
            true
        }
        Err(err) => {
            warn!("[SystemSync] Database restore failed (continuing): {}", err);
            false
        }
    }
}
