//! Transfer package assembly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::types::PackageManifest;
use crate::workspace::SyncWorkspace;

/// File name of the assembled package inside the workspace.
pub const PACKAGE_FILE_NAME: &str = "sync_package.zip";

/// Entry name of the SQL dump inside the package.
pub const DUMP_ENTRY_NAME: &str = "database_dump.sql";

/// Entry name of the code archive inside the package.
pub const CODE_ENTRY_NAME: &str = "code_archive.zip";

/// Entry name of the manifest inside the package.
pub const MANIFEST_ENTRY_NAME: &str = "metadata.json";

/// Entry name of the install script inside the package.
pub const INSTALL_ENTRY_NAME: &str = "install.sh";

const INSTALL_SCRIPT: &str = r#"#!/bin/sh
# Apply a Palanque sync package in the current directory.
set -e

if [ -f code_archive.zip ]; then
    unzip -o code_archive.zip -d .
fi

if [ -f database_dump.sql ] && [ -n "$DATABASE_URL" ]; then
    psql "$DATABASE_URL" -v ON_ERROR_STOP=1 -f database_dump.sql
fi
"#;

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
}

/// Assemble the single transfer package for one push sync.
///
/// The dump and code entries are each included only when the config enables
/// them and the artifact exists; the manifest and install script are always
/// present, so a config with both inclusions disabled still produces a
/// valid package.
pub fn assemble_package(
    workspace: &SyncWorkspace,
    config: &SyncConfig,
    dump: Option<&Path>,
    code_archive: Option<&Path>,
) -> Result<PathBuf> {
    let include_database = config.include_database_dump && dump.is_some();
    let include_code = config.include_code && code_archive.is_some();
    let output = workspace.join(PACKAGE_FILE_NAME);

    let file = File::create(&output)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    if include_database {
        if let Some(dump) = dump {
            writer.start_file(DUMP_ENTRY_NAME, entry_options())?;
            let mut source = File::open(dump)?;
            std::io::copy(&mut source, &mut writer)?;
        }
    }
    if include_code {
        if let Some(code_archive) = code_archive {
            writer.start_file(CODE_ENTRY_NAME, entry_options())?;
            let mut source = File::open(code_archive)?;
            std::io::copy(&mut source, &mut writer)?;
        }
    }

    let manifest = PackageManifest::new(include_database, include_code);
    writer.start_file(MANIFEST_ENTRY_NAME, entry_options())?;
    writer.write_all(&serde_json::to_vec_pretty(&manifest)?)?;

    writer.start_file(
        INSTALL_ENTRY_NAME,
        entry_options().unix_permissions(0o755),
    )?;
    writer.write_all(INSTALL_SCRIPT.as_bytes())?;

    let mut inner = writer.finish()?;
    inner.flush()?;
    debug!(
        "[SystemSync] Assembled package (database={}, code={}) at {}",
        include_database,
        include_code,
        output.display()
    );
    Ok(output)
}
