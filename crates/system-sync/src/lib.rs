//! Deployment-to-deployment system sync for the Palanque campaign platform.
//!
//! One deployment can replicate itself onto another in two ways:
//!
//! - **Push sync**: dump the database, archive the code tree, assemble a
//!   single package and POST it to a configured target deployment.
//! - **Pull sync**: serve an [`ExportPackage`] (database dump, code archive,
//!   allow-listed environment values and the admin settings file) to an
//!   authenticated peer, which applies it locally via [`run_import`].
//!
//! Every operation owns a private temporary workspace that is removed on
//! every exit path. The external HTTP layer that exposes these operations
//! is not part of this crate; it must authenticate callers before invoking
//! the export path.

mod archive;
mod client;
mod config;
mod error;
mod export;
mod import;
mod package;
mod push;
mod tools;
mod types;
mod workspace;

#[cfg(test)]
mod testutil;

pub use archive::{build_code_archive, CODE_ARCHIVE_DIRS, CODE_ARCHIVE_FILES};
pub use client::{SystemSyncClient, SYNC_SOURCE_HEADER};
pub use config::{DatabaseConfig, EnvSnapshot, SyncConfig, SYNC_ENV_KEYS};
pub use error::{Result, SystemSyncError};
pub use export::generate_export_package;
pub use import::run_import;
pub use package::{
    assemble_package, CODE_ENTRY_NAME, DUMP_ENTRY_NAME, INSTALL_ENTRY_NAME, MANIFEST_ENTRY_NAME,
    PACKAGE_FILE_NAME,
};
pub use push::run_push_sync;
pub use tools::{DatabaseTools, PgTools, EXTERNAL_TOOL_TIMEOUT};
pub use types::{
    sha256_checksum, ExportMetadata, ExportPackage, ImportDetails, ImportResult, PackageManifest,
    PushEnvelope, PushMetadata, SyncDetails, SyncResult, EXPORT_ENDPOINT_PATH,
    SYNC_PACKAGE_VERSION, SYNC_SOURCE,
};
pub use workspace::SyncWorkspace;
