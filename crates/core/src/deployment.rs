//! Deployment root resolution.

use std::path::PathBuf;

/// Environment variable that overrides the deployment root.
pub const DEPLOYMENT_ROOT_ENV: &str = "PALANQUE_ROOT";

/// Resolve the deployment root directory.
///
/// Boundary helper: reads the process environment once so that inner
/// components can take plain paths instead of consulting globals.
pub fn deployment_root() -> PathBuf {
    std::env::var_os(DEPLOYMENT_ROOT_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}
