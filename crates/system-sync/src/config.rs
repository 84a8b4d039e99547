//! Sync configuration and environment boundary.
//!
//! Core components never touch the process environment directly; the
//! `from_env`/`capture` helpers here are the single boundary where it is
//! read, once per operation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SystemSyncError};

/// Canonical allow-list of environment variables eligible for sync.
///
/// Database credentials plus the third-party integration secrets of the
/// platform. Values of keys outside this list never enter a sync package.
pub const SYNC_ENV_KEYS: [&str; 8] = [
    "DATABASE_URL",
    "OPENAI_API_KEY",
    "WHATSAPP_API_TOKEN",
    "GOOGLE_CALENDAR_CLIENT_ID",
    "GOOGLE_CALENDAR_CLIENT_SECRET",
    "TSE_DATA_API_URL",
    "BILLING_API_KEY",
    "SESSION_SECRET",
];

fn default_true() -> bool {
    true
}

/// Configuration for one push sync invocation. Transient, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    /// Destination deployment URL receiving the package.
    pub target_url: String,
    /// Bearer credential presented to the destination.
    pub api_key: String,
    /// Include the code archive in the package.
    #[serde(default = "default_true")]
    pub include_code: bool,
    /// Include the database dump in the package.
    #[serde(default = "default_true")]
    pub include_database_dump: bool,
}

impl SyncConfig {
    /// Create a config with both inclusions enabled.
    pub fn new(target_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            api_key: api_key.into(),
            include_code: true,
            include_database_dump: true,
        }
    }

    /// Build a config from `SYNC_TARGET_URL` / `SYNC_API_KEY` /
    /// `SYNC_INCLUDE_CODE` / `SYNC_INCLUDE_DATABASE`.
    pub fn from_env() -> Result<Self> {
        let target_url = require_env("SYNC_TARGET_URL")?;
        let api_key = require_env("SYNC_API_KEY")?;
        Ok(Self {
            target_url,
            api_key,
            include_code: env_flag("SYNC_INCLUDE_CODE", true),
            include_database_dump: env_flag("SYNC_INCLUDE_DATABASE", true),
        })
    }

    /// Fail fast on a config that cannot possibly transfer.
    pub fn validate(&self) -> Result<()> {
        if self.target_url.trim().is_empty() {
            return Err(SystemSyncError::configuration(
                "Sync target URL is not configured",
            ));
        }
        if !self.target_url.starts_with("http://") && !self.target_url.starts_with("https://") {
            return Err(SystemSyncError::configuration(format!(
                "Sync target URL must be http(s): {}",
                self.target_url
            )));
        }
        if self.api_key.trim().is_empty() {
            return Err(SystemSyncError::configuration(
                "Sync API key is not configured",
            ));
        }
        Ok(())
    }
}

/// Local database connection configuration.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

impl DatabaseConfig {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.filter(|value| !value.trim().is_empty()),
        }
    }

    /// Build from `DATABASE_URL`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("DATABASE_URL").ok())
    }

    /// Connection string, or a configuration error when none is set.
    pub fn require_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| SystemSyncError::configuration("DATABASE_URL is not configured"))
    }
}

/// Point-in-time view of the allow-listed environment variables.
///
/// Only keys from [`SYNC_ENV_KEYS`] can be held; anything else passed in is
/// dropped on construction, so a snapshot can never leak values beyond the
/// declared set.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    values: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the allow-listed variables from the process environment.
    pub fn capture() -> Self {
        Self::from_pairs(
            SYNC_ENV_KEYS
                .iter()
                .filter_map(|key| std::env::var(key).ok().map(|value| (*key, value))),
        )
    }

    /// Build a snapshot from explicit pairs; non-allow-listed keys are dropped.
    pub fn from_pairs<K: AsRef<str>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        let mut values = BTreeMap::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value: String = value.into();
            if SYNC_ENV_KEYS.contains(&key) && !value.is_empty() {
                values.insert(key.to_string(), value);
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Allow-listed variables currently set, keyed by name.
    pub fn to_map(&self) -> BTreeMap<String, Option<String>> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), Some(value.clone())))
            .collect()
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SystemSyncError::configuration(format!("{} is not configured", name)))
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_flag(&value, default),
        Err(_) => default,
    }
}

fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_defaults_to_full_package() {
        let config = SyncConfig::new("https://x.test/sync", "k");
        assert!(config.include_code);
        assert!(config.include_database_dump);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_pieces() {
        let mut config = SyncConfig::new("", "k");
        assert!(matches!(
            config.validate(),
            Err(SystemSyncError::Configuration(_))
        ));
        config.target_url = "ftp://x.test".to_string();
        assert!(config.validate().is_err());
        config.target_url = "https://x.test".to_string();
        config.api_key = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_deserializes_with_defaulted_flags() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"targetUrl":"https://x.test","apiKey":"k"}"#)
                .expect("parse config");
        assert!(config.include_code);
        assert!(config.include_database_dump);
    }

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert!(parse_flag("TRUE", false));
        assert!(parse_flag("on", false));
        assert!(!parse_flag("0", true));
        assert!(!parse_flag("No", true));
        assert!(parse_flag("gibberish", true));
    }

    #[test]
    fn database_config_requires_url() {
        let config = DatabaseConfig::new(None);
        assert!(matches!(
            config.require_url(),
            Err(SystemSyncError::Configuration(_))
        ));
        let config = DatabaseConfig::new(Some("postgres://localhost/campaign".to_string()));
        assert_eq!(
            config.require_url().expect("url"),
            "postgres://localhost/campaign"
        );
    }

    #[test]
    fn snapshot_drops_keys_outside_allow_list() {
        let snapshot = EnvSnapshot::from_pairs([
            ("DATABASE_URL", "postgres://localhost/campaign"),
            ("PATH", "/usr/bin"),
            ("AWS_SECRET_ACCESS_KEY", "nope"),
        ]);
        assert!(snapshot.is_set("DATABASE_URL"));
        assert!(!snapshot.is_set("PATH"));
        assert!(!snapshot.is_set("AWS_SECRET_ACCESS_KEY"));
        let map = snapshot.to_map();
        assert_eq!(map.len(), 1);
        assert!(map.keys().all(|key| SYNC_ENV_KEYS.contains(&key.as_str())));
    }

    #[test]
    fn snapshot_ignores_empty_values() {
        let snapshot = EnvSnapshot::from_pairs([("OPENAI_API_KEY", "")]);
        assert!(!snapshot.is_set("OPENAI_API_KEY"));
    }
}
