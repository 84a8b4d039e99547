//! External database tool invocation.
//!
//! Dump and restore are delegated to the PostgreSQL client tools behind a
//! narrow trait, so callers never depend on how the subprocess is driven
//! and tests can substitute a fake.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::error::{Result, SystemSyncError};

/// Wall-clock bound for one external tool invocation.
pub const EXTERNAL_TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// External database dump/restore collaborators.
///
/// `produce_dump` writes exactly one file at `output` and must not mutate
/// the source database. On timeout a partial file may remain; the owning
/// workspace is responsible for cleaning it up.
#[async_trait]
pub trait DatabaseTools: Send + Sync {
    async fn produce_dump(&self, database_url: &str, output: &Path) -> Result<()>;
    async fn restore_dump(&self, database_url: &str, dump: &Path) -> Result<()>;
}

/// [`DatabaseTools`] implementation shelling out to `pg_dump` and `psql`.
#[derive(Debug, Clone)]
pub struct PgTools {
    dump_program: String,
    restore_program: String,
    timeout: Duration,
}

impl Default for PgTools {
    fn default() -> Self {
        Self::new()
    }
}

impl PgTools {
    pub fn new() -> Self {
        Self::with_programs("pg_dump", "psql")
    }

    /// Override the invoked programs (tests, non-standard installs).
    pub fn with_programs(dump_program: impl Into<String>, restore_program: impl Into<String>) -> Self {
        Self {
            dump_program: dump_program.into(),
            restore_program: restore_program.into(),
            timeout: EXTERNAL_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(
        &self,
        program: &str,
        command: &mut Command,
        failure: fn(String) -> SystemSyncError,
    ) -> Result<()> {
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
        command.stderr(Stdio::piped());
        command.kill_on_drop(true);

        // Dropping the future on timeout kills the child via kill_on_drop.
        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    Err(failure(format!(
                        "{} exited with {}: {}",
                        program, output.status, stderr
                    )))
                }
            }
            Ok(Err(err)) => Err(failure(format!("failed to launch {}: {}", program, err))),
            Err(_) => Err(failure(format!(
                "{} timed out after {}s",
                program,
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl DatabaseTools for PgTools {
    async fn produce_dump(&self, database_url: &str, output: &Path) -> Result<()> {
        if database_url.trim().is_empty() {
            return Err(SystemSyncError::configuration(
                "Database connection string is not configured",
            ));
        }
        debug!(
            "[SystemSync] Running {} into {}",
            self.dump_program,
            output.display()
        );
        let mut command = Command::new(&self.dump_program);
        command
            .arg("--format=plain")
            .arg("--no-owner")
            .arg("--no-privileges")
            .arg("--file")
            .arg(output)
            .arg(database_url);
        self.run(&self.dump_program, &mut command, SystemSyncError::Dump)
            .await
    }

    async fn restore_dump(&self, database_url: &str, dump: &Path) -> Result<()> {
        if database_url.trim().is_empty() {
            return Err(SystemSyncError::configuration(
                "Database connection string is not configured",
            ));
        }
        debug!(
            "[SystemSync] Restoring {} via {}",
            dump.display(),
            self.restore_program
        );
        let mut command = Command::new(&self.restore_program);
        command
            .arg(database_url)
            .arg("--quiet")
            .arg("-v")
            .arg("ON_ERROR_STOP=1")
            .arg("--file")
            .arg(dump);
        self.run(&self.restore_program, &mut command, SystemSyncError::Restore)
            .await
    }
}
