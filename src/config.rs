//! # Configuration
//!
//! Optional user configuration read from `~/.config/mktui/config.json`.
//!
//! ## Overview
//!
//! Every field has a default, so a missing file (or a file that sets only a
//! few keys) is fine. The file is never written by mktui.
//!
//! ```json
//! {
//!   "descriptor": "Makefile",
//!   "program": "make",
//!   "args": [],
//!   "on_supersede": "abandon",
//!   "show_exit_status": true,
//!   "log_level": "info"
//! }
//! ```
//!
//! The `directories` crate is used to resolve the platform-appropriate config
//! directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::runner::SupersedePolicy;

/// User configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Build descriptor file name, resolved against the working directory.
    #[serde(default = "default_descriptor")]
    pub descriptor: String,

    /// External build tool invoked with the selected target.
    #[serde(default = "default_program")]
    pub program: String,

    /// Extra arguments placed before the target name.
    #[serde(default)]
    pub args: Vec<String>,

    /// What to do with a still-running execution when a new one starts.
    #[serde(default)]
    pub on_supersede: SupersedePolicy,

    /// Report the active execution's status in the output view title.
    #[serde(default = "default_true")]
    pub show_exit_status: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_descriptor() -> String {
    "Makefile".to_string()
}

fn default_program() -> String {
    "make".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            descriptor: default_descriptor(),
            program: default_program(),
            args: Vec::new(),
            on_supersede: SupersedePolicy::default(),
            show_exit_status: true,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Try to load configuration, returning an error on failure.
    pub fn try_load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path. Returns `Config::default()` if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Descriptor path inside `dir`.
    pub fn descriptor_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.descriptor)
    }

    fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "mktui")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.descriptor, "Makefile");
        assert_eq!(config.program, "make");
        assert!(config.args.is_empty());
        assert_eq!(config.on_supersede, SupersedePolicy::Abandon);
        assert!(config.show_exit_status);
    }

    #[test]
    fn test_deserialize_empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"program": "gmake", "on_supersede": "cancel"}"#;
        let config: Config = serde_json::from_str(json).expect("deserialize");
        assert_eq!(config.program, "gmake");
        assert_eq!(config.on_supersede, SupersedePolicy::Cancel);
        assert_eq!(config.descriptor, "Makefile");
    }

    #[test]
    fn test_deny_unknown_fields() {
        let json = r#"{"program": "make", "theme": "Nord"}"#;
        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err(), "should reject unknown fields");
    }

    #[test]
    fn test_load_from_missing_file_returns_default() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("does_not_exist.json");

        let loaded = Config::load_from(&config_path).expect("load_from");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"descriptor": "GNUmakefile", "show_exit_status": false}"#,
        )
        .expect("write");

        let loaded = Config::load_from(&config_path).expect("load_from");
        assert_eq!(loaded.descriptor, "GNUmakefile");
        assert!(!loaded.show_exit_status);
    }

    #[test]
    fn test_load_from_invalid_json_is_error() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let config_path = temp_dir.path().join("config.json");
        fs::write(&config_path, "{ not json").expect("write");

        let err = Config::load_from(&config_path).expect_err("invalid json");
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_descriptor_path() {
        let config = Config::default();
        assert_eq!(
            config.descriptor_path(Path::new("/work")),
            PathBuf::from("/work/Makefile")
        );
    }
}
