//! TOML-based configuration for the glyphmap command-line tool.
//!
//! The file lives at `$XDG_CONFIG_HOME/glyphmap/config.toml`, falling back to
//! `~/.config/glyphmap/config.toml`.  A missing file is not an error: every
//! field has a default, so the tool works on first run.
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [display]
//! name = ":1"
//!
//! [keysyms]
//! table = "/usr/share/glyphmap/keysyms.txt"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the field is absent from the TOML file.  Whole sections
//! carry `#[serde(default)]`, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glyphmap_core::{DataFormatError, GlyphResolver, KeysymTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Sub-directory of the XDG config base holding our files.
const APP_DIR_NAME: &str = "glyphmap";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `XDG_CONFIG_HOME` nor `HOME` is set.
    #[error("could not determine config directory (XDG_CONFIG_HOME and HOME are unset)")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// `init-config` found a file in the way and was not told to replace it.
    #[error("{path} already exists; pass --force to overwrite")]
    AlreadyExists { path: PathBuf },

    /// The keysym table named in `[keysyms] table` could not be loaded.
    #[error(transparent)]
    Keysyms(#[from] DataFormatError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub keysyms: KeysymsConfig,
}

/// General tool behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which X display to connect to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Display name such as `":0"`.  `None` uses `$DISPLAY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Where the legacy keysym table comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeysymsConfig {
    /// Path to a `keysyms.txt` dataset.  `None` uses the bundled table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Builds the glyph resolver this configuration asks for.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Keysyms`] when a custom table is configured
    /// and cannot be loaded.
    pub fn resolver(&self) -> Result<GlyphResolver, ConfigError> {
        let table = match &self.keysyms.table {
            Some(path) => Arc::new(KeysymTable::load(path)?),
            None => KeysymTable::shared(),
        };
        Ok(GlyphResolver::new(table))
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the directory holding the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            debug!(path = %path.display(), "config loaded");
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file; using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Writes the default configuration to `path`.
///
/// The existing file is never read, so `force` also replaces a file that
/// no longer parses.
///
/// # Errors
///
/// Returns [`ConfigError::AlreadyExists`] if `path` exists and `force` is
/// `false`, otherwise whatever [`save_config`] returns.
pub fn write_default_config(path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    save_config(&AppConfig::default(), path)?;
    debug!(path = %path.display(), force, "default config written");
    Ok(())
}

/// `$XDG_CONFIG_HOME/glyphmap`, or `~/.config/glyphmap`.
fn platform_config_dir() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(base.join(APP_DIR_NAME))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("glyphmap_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_log_level_is_warn() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_app_config_default_uses_env_display_and_bundled_table() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.display.name, None);
        assert_eq!(cfg.keysyms.table, None);
    }

    // ── TOML parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_sections_override_defaults() {
        // Arrange
        let toml_str = r#"
[display]
name = ":1"

[keysyms]
table = "/opt/keysyms.txt"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.display.name.as_deref(), Some(":1"));
        assert_eq!(cfg.keysyms.table, Some(PathBuf::from("/opt/keysyms.txt")));
        // Unspecified sections keep their defaults
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_default_config_serializes_without_optional_fields() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");
        assert!(toml_str.contains("log_level"));
        assert!(!toml_str.contains("name"), "None display name must be omitted");
        assert!(!toml_str.contains("table"), "None table path must be omitted");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.general.log_level = "debug".to_string();
        cfg.display.name = Some(":2".to_string());

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    // ── load / save ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[general\nlog_level = ").unwrap();

        let err = load_config_from(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_default_config_with_force_replaces_malformed_file() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[general\nlog_level = ").unwrap();

        // Act
        write_default_config(&path, true).unwrap();

        // Assert
        assert_eq!(load_config_from(&path).unwrap(), AppConfig::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_default_config_without_force_keeps_existing_file() {
        let dir = temp_dir();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[display]\nname = \":7\"\n").unwrap();

        let err = write_default_config(&path, false).unwrap_err();

        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
        assert_eq!(
            load_config_from(&path).unwrap().display.name.as_deref(),
            Some(":7")
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_write_default_config_creates_missing_parent_dirs() {
        let dir = temp_dir();
        let path = dir.join("a").join("b").join("config.toml");

        write_default_config(&path, false).unwrap();

        assert!(path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.general.log_level = "trace".to_string();
        cfg.keysyms.table = Some(dir.join("keysyms.txt"));

        // Act
        save_config(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── resolver construction ─────────────────────────────────────────────────

    #[test]
    fn test_resolver_without_table_uses_bundled_data() {
        let resolver = AppConfig::default().resolver().unwrap();
        assert_eq!(resolver.resolve('ł'), 0x01b3);
    }

    #[test]
    fn test_resolver_loads_configured_table() {
        // Arrange
        let dir = temp_dir();
        let table_path = dir.join("keysyms.txt");
        std::fs::write(&table_path, "0x1B5 U00A1 .\n").unwrap();
        let mut cfg = AppConfig::default();
        cfg.keysyms.table = Some(table_path);

        // Act
        let resolver = cfg.resolver().unwrap();

        // Assert
        assert_eq!(resolver.resolve('\u{00A1}'), 0x1B5);
        // 'ł' is not in the custom table, so the Unicode rule applies.
        assert_eq!(resolver.resolve('ł'), 0x0100_0142);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_resolver_with_missing_table_is_keysyms_error() {
        let mut cfg = AppConfig::default();
        cfg.keysyms.table = Some(PathBuf::from("/nonexistent/glyphmap/keysyms.txt"));

        let err = cfg.resolver().unwrap_err();

        assert!(matches!(err, ConfigError::Keysyms(DataFormatError::Io { .. })));
    }

    // ── config_dir path formation ─────────────────────────────────────────────

    #[test]
    fn test_config_file_path_ends_with_glyphmap_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("glyphmap/config.toml"),
                "config file must be glyphmap/config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped CI environment is also acceptable.
    }
}
