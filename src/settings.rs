//! Executor configuration.
//!
//! Load order: explicit file (or the first default path that exists), then
//! `POSTGRUSTQL_EXEC_*` environment variables, then built-in defaults.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::dialect::DialectKind;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutorSettings {
    /// Selects the quirk hooks; no SQL is generated from it
    #[serde(default)]
    pub dialect: DialectKind,
    /// Schema pinned before each statement on targets that support it
    #[serde(default)]
    pub default_schema: Option<String>,
    #[serde(default = "default_disable_escape")]
    pub disable_escape_processing_on_placeholder: bool,
}

const fn default_disable_escape() -> bool {
    true
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Generic,
            default_schema: None,
            disable_escape_processing_on_placeholder: default_disable_escape(),
        }
    }
}

impl ExecutorSettings {
    pub const ENV_PREFIX: &'static str = "POSTGRUSTQL_EXEC";

    /// Candidate config files, most global first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/postgrustql/executor.toml")];
        if let Some(mut dir) = dirs::config_dir() {
            dir.push("postgrustql");
            dir.push("executor.toml");
            paths.push(dir);
        }
        paths.push(PathBuf::from("./executor.toml"));
        paths
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(SettingsError::NotFound(path.to_path_buf()));
                }
                builder = builder.add_source(File::from(path));
            }
            None => {
                if let Some(path) = Self::default_paths().into_iter().find(|p| p.exists()) {
                    tracing::debug!("Loaded executor config from: {}", path.display());
                    builder = builder.add_source(File::from(path.as_path()));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = ExecutorSettings::default();
        assert_eq!(settings.dialect, DialectKind::Generic);
        assert_eq!(settings.default_schema, None);
        assert!(settings.disable_escape_processing_on_placeholder);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executor.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "dialect = \"postgresql\"").unwrap();
        writeln!(file, "default_schema = \"app\"").unwrap();
        drop(file);

        let settings = ExecutorSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.dialect, DialectKind::Postgres);
        assert_eq!(settings.default_schema.as_deref(), Some("app"));
        assert!(settings.disable_escape_processing_on_placeholder);
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("executor.toml");
        std::fs::write(&path, "dialect = \"db2\"\n").unwrap();

        assert!(matches!(
            ExecutorSettings::load(Some(&path)),
            Err(SettingsError::Config(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            ExecutorSettings::load(Some(&path)),
            Err(SettingsError::NotFound(_))
        ));
    }
}
