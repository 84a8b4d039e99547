//! Code archive builder.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Result, SystemSyncError};

/// Directories eligible for the code archive, relative to the deployment root.
pub const CODE_ARCHIVE_DIRS: [&str; 5] = ["crates", "apps", "migrations", "config", "public"];

/// Top-level files eligible for the code archive.
pub const CODE_ARCHIVE_FILES: [&str; 4] =
    ["Cargo.toml", "Cargo.lock", "rust-toolchain.toml", ".env.example"];

/// Names pruned anywhere in the tree: build artifacts and VCS metadata.
const EXCLUDED_NAMES: [&str; 3] = ["target", ".git", "node_modules"];

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
}

fn zip_entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Archive the fixed allow-list of source directories and top-level files
/// into a zip at `output`.
///
/// Allow-listed paths absent on disk are silently skipped. The archive path
/// is returned only after the output stream has been fully written and
/// flushed.
pub fn build_code_archive(deployment_root: &Path, output: &Path) -> Result<PathBuf> {
    let file = File::create(output)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let mut entry_count = 0usize;

    for dir in CODE_ARCHIVE_DIRS {
        let base = deployment_root.join(dir);
        if !base.is_dir() {
            continue;
        }
        let mut builder = WalkBuilder::new(&base);
        builder
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !EXCLUDED_NAMES.contains(&name.as_ref())
            });
        for entry in builder.build() {
            let entry = entry.map_err(|err| SystemSyncError::archive(err.to_string()))?;
            if !entry.file_type().map(|kind| kind.is_file()).unwrap_or(false) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(deployment_root)
                .map_err(|err| SystemSyncError::archive(err.to_string()))?;
            writer.start_file(zip_entry_name(relative), entry_options())?;
            let mut source = File::open(entry.path())?;
            std::io::copy(&mut source, &mut writer)?;
            entry_count += 1;
        }
    }

    for name in CODE_ARCHIVE_FILES {
        let path = deployment_root.join(name);
        if !path.is_file() {
            continue;
        }
        writer.start_file(name, entry_options())?;
        let mut source = File::open(&path)?;
        std::io::copy(&mut source, &mut writer)?;
        entry_count += 1;
    }

    let mut inner = writer.finish()?;
    inner.flush()?;
    debug!(
        "[SystemSync] Archived {} entries from {} into {}",
        entry_count,
        deployment_root.display(),
        output.display()
    );
    Ok(output.to_path_buf())
}
