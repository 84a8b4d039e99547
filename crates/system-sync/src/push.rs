//! Push sync entry point.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};

use crate::archive::build_code_archive;
use crate::client::SystemSyncClient;
use crate::config::{DatabaseConfig, SyncConfig};
use crate::error::Result;
use crate::package::{assemble_package, CODE_ENTRY_NAME, DUMP_ENTRY_NAME};
use crate::tools::DatabaseTools;
use crate::types::{PushEnvelope, SyncDetails, SyncResult};
use crate::workspace::SyncWorkspace;

/// Build a sync package per the config and POST it to the target
/// deployment.
///
/// Validates the config before any work starts, then runs dump, archive,
/// assembly and transfer against a private workspace. Every internal
/// failure is converted into a structured [`SyncResult`]; this never
/// returns a raw fault, and the workspace is removed on every exit path.
pub async fn run_push_sync(
    config: &SyncConfig,
    database: &DatabaseConfig,
    tools: &dyn DatabaseTools,
    deployment_root: &Path,
) -> SyncResult {
    let started_at = Instant::now();

    if let Err(err) = config.validate() {
        warn!("[SystemSync] Push sync rejected: {}", err);
        return SyncResult::failed("System sync is not configured", err.to_string());
    }

    info!(
        "[SystemSync] Push sync to {} (database={}, code={})",
        config.target_url, config.include_database_dump, config.include_code
    );
    match push_sync_inner(config, database, tools, deployment_root, started_at).await {
        Ok(details) => {
            info!(
                "[SystemSync] Push sync complete ({} bytes in {} ms)",
                details.package_bytes, details.duration_ms
            );
            SyncResult::ok("System sync package transferred", details)
        }
        Err(err) => {
            warn!("[SystemSync] Push sync failed: {}", err);
            SyncResult::failed("System sync failed", err.to_string())
        }
    }
}

async fn push_sync_inner(
    config: &SyncConfig,
    database: &DatabaseConfig,
    tools: &dyn DatabaseTools,
    deployment_root: &Path,
    started_at: Instant,
) -> Result<SyncDetails> {
    let workspace = SyncWorkspace::create()?;

    let mut dump_path: Option<PathBuf> = None;
    let mut dump_bytes = None;
    if config.include_database_dump {
        let database_url = database.require_url()?;
        let path = workspace.join(DUMP_ENTRY_NAME);
        tools.produce_dump(database_url, &path).await?;
        dump_bytes = Some(std::fs::metadata(&path)?.len());
        dump_path = Some(path);
    }

    let mut code_path: Option<PathBuf> = None;
    let mut code_bytes = None;
    if config.include_code {
        let path = workspace.join(CODE_ENTRY_NAME);
        build_code_archive(deployment_root, &path)?;
        code_bytes = Some(std::fs::metadata(&path)?.len());
        code_path = Some(path);
    }

    let package_path = assemble_package(
        &workspace,
        config,
        dump_path.as_deref(),
        code_path.as_deref(),
    )?;
    let package = std::fs::read(&package_path)?;
    let envelope = PushEnvelope::for_package(&package);

    let client = SystemSyncClient::new();
    client
        .push_package(&config.target_url, &config.api_key, &envelope)
        .await?;

    Ok(SyncDetails {
        package_bytes: package.len() as u64,
        dump_bytes,
        code_bytes,
        includes_database: dump_path.is_some(),
        includes_code: code_path.is_some(),
        duration_ms: started_at.elapsed().as_millis() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{spawn_mock_server, FakeTools, MockResponse};
    use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
    use std::collections::BTreeSet;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn local_database() -> DatabaseConfig {
        DatabaseConfig::new(Some("postgres://localhost/campaign".to_string()))
    }

    fn package_entries(body: &str) -> BTreeSet<String> {
        let envelope: serde_json::Value = serde_json::from_str(body).expect("envelope json");
        let package = BASE64_STANDARD
            .decode(envelope["package"].as_str().expect("package field"))
            .expect("decode package");
        let archive = zip::ZipArchive::new(Cursor::new(package)).expect("read package zip");
        archive.file_names().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn unconfigured_target_fails_fast() {
        let root = tempdir().expect("tempdir");
        let tools = FakeTools::with_dump("-- dump");
        let config = SyncConfig::new("", "k");

        let result = run_push_sync(&config, &local_database(), &tools, root.path()).await;
        assert!(!result.success);
        assert!(result
            .error
            .expect("error")
            .contains("target URL is not configured"));
    }

    #[tokio::test]
    async fn database_inclusion_requires_a_connection_string() {
        let root = tempdir().expect("tempdir");
        let tools = FakeTools::with_dump("-- dump");
        let config = SyncConfig::new("https://x.test/sync", "k");

        let result =
            run_push_sync(&config, &DatabaseConfig::new(None), &tools, root.path()).await;
        assert!(!result.success);
        assert!(result.error.expect("error").contains("DATABASE_URL"));
    }

    #[tokio::test]
    async fn full_push_transfers_the_assembled_package() {
        let root = tempdir().expect("tempdir");
        std::fs::create_dir_all(root.path().join("crates/core/src")).expect("mkdir");
        std::fs::write(root.path().join("crates/core/src/lib.rs"), "pub fn x() {}")
            .expect("write source");
        let tools = FakeTools::with_dump("-- campaign dump");
        let (base_url, captured, server) = spawn_mock_server(MockResponse {
            status: 200,
            body: r#"{"received":true}"#.to_string(),
        })
        .await;
        let config = SyncConfig::new(format!("{}/sync", base_url), "k");

        let result = run_push_sync(&config, &local_database(), &tools, root.path()).await;
        assert!(result.success, "push failed: {:?}", result.error);
        let details = result.details.expect("details");
        assert!(details.includes_database);
        assert!(details.includes_code);
        assert!(details.package_bytes > 0);

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 1);
        let entries = package_entries(&requests[0].body);
        assert!(entries.contains("database_dump.sql"));
        assert!(entries.contains("code_archive.zip"));
        assert!(entries.contains("metadata.json"));
        assert!(entries.contains("install.sh"));

        server.abort();
    }

    #[tokio::test]
    async fn database_disabled_push_needs_no_connection_string() {
        let root = tempdir().expect("tempdir");
        let tools = FakeTools::default();
        let (base_url, captured, server) = spawn_mock_server(MockResponse {
            status: 200,
            body: r#"{"received":true}"#.to_string(),
        })
        .await;
        let mut config = SyncConfig::new(format!("{}/sync", base_url), "k");
        config.include_database_dump = false;

        let result =
            run_push_sync(&config, &DatabaseConfig::new(None), &tools, root.path()).await;
        assert!(result.success, "push failed: {:?}", result.error);
        let details = result.details.expect("details");
        assert!(!details.includes_database);
        assert!(details.includes_code);

        let requests = captured.lock().await.clone();
        let entries = package_entries(&requests[0].body);
        assert!(!entries.contains("database_dump.sql"));
        assert!(entries.contains("code_archive.zip"));

        server.abort();
    }

    #[tokio::test]
    async fn remote_rejection_becomes_a_structured_failure() {
        let root = tempdir().expect("tempdir");
        let tools = FakeTools::with_dump("-- dump");
        let (base_url, _captured, server) = spawn_mock_server(MockResponse {
            status: 500,
            body: "receiver exploded".to_string(),
        })
        .await;
        let config = SyncConfig::new(format!("{}/sync", base_url), "k");

        let result = run_push_sync(&config, &local_database(), &tools, root.path()).await;
        assert!(!result.success);
        let error = result.error.expect("error");
        assert!(error.contains("500"));
        assert!(error.contains("receiver exploded"));

        server.abort();
    }

    #[tokio::test]
    async fn dump_failure_becomes_a_structured_failure() {
        let root = tempdir().expect("tempdir");
        let tools = FakeTools {
            fail_dump: true,
            ..FakeTools::default()
        };
        let config = SyncConfig::new("https://x.test/sync", "k");

        let result = run_push_sync(&config, &local_database(), &tools, root.path()).await;
        assert!(!result.success);
        assert!(result
            .error
            .expect("error")
            .contains("connection refused"));
    }
}
