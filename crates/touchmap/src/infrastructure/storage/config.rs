//! TOML-based configuration for the mapper.
//!
//! Reads [`AppConfig`] from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\TouchMap\config.toml`
//! - Linux:    `~/.config/touchmap/config.toml`
//! - macOS:    `~/Library/Application Support/TouchMap/config.toml`
//!
//! ```toml
//! [general]
//! log_level = "info"
//!
//! [store]
//! key_path = 'SOFTWARE\Microsoft\Wisp\Pen\Digimon'
//! match_policy = "strict"
//!
//! [compositor]
//! process_name = "dwm.exe"
//!
//! [digitizer]
//! usage_page = 13
//! usage_id = 4
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section and
//! a missing key all fall back to the values above.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use touchmap_core::domain::device::{HID_USAGE_DIGITIZER_TOUCH_SCREEN, HID_USAGE_PAGE_DIGITIZER};
use touchmap_core::{DeviceSelector, MatchPolicy};

use crate::application::apply_trigger::DEFAULT_COMPOSITOR_PROCESS;
use crate::application::mapping_store::DEFAULT_KEY_PATH;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
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
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub compositor: CompositorConfig,
    #[serde(default)]
    pub digitizer: DigitizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Where digitizer-to-display mappings live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Store path, relative to `HKEY_LOCAL_MACHINE` on Windows.
    #[serde(default = "default_key_path")]
    pub key_path: String,
    /// How to treat a digitizer id contained in more than one store key.
    #[serde(default)]
    pub match_policy: MatchPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositorConfig {
    /// Executable name of the process restarted to apply a mapping.
    #[serde(default = "default_process_name")]
    pub process_name: String,
}

/// HID usage identifying touchscreens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigitizerConfig {
    #[serde(default = "default_usage_page")]
    pub usage_page: u16,
    #[serde(default = "default_usage_id")]
    pub usage_id: u16,
}

impl DigitizerConfig {
    /// The discovery selector for the configured usage.
    pub fn selector(&self) -> DeviceSelector {
        DeviceSelector::HidUsage {
            usage_page: self.usage_page,
            usage_id: self.usage_id,
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_key_path() -> String {
    DEFAULT_KEY_PATH.to_string()
}
fn default_process_name() -> String {
    DEFAULT_COMPOSITOR_PROCESS.to_string()
}
fn default_usage_page() -> u16 {
    HID_USAGE_PAGE_DIGITIZER
}
fn default_usage_id() -> u16 {
    HID_USAGE_DIGITIZER_TOUCH_SCREEN
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_path: default_key_path(),
            match_policy: MatchPolicy::default(),
        }
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
        }
    }
}

impl Default for DigitizerConfig {
    fn default() -> Self {
        Self {
            usage_page: default_usage_page(),
            usage_id: default_usage_id(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file, returning
/// `AppConfig::default()` if the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`; a missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Resolves the platform config directory, including the `TouchMap` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TouchMap"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("touchmap"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("TouchMap")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("touchmap_test_{}_{name}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_app_config_default_targets_pen_digimon_key() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.store.key_path, r"SOFTWARE\Microsoft\Wisp\Pen\Digimon");
        assert_eq!(cfg.store.match_policy, MatchPolicy::Strict);
        assert_eq!(cfg.compositor.process_name, "dwm.exe");
        assert_eq!(cfg.general.log_level, "info");
    }

    #[test]
    fn test_default_digitizer_selector_is_touch_screen() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.digitizer.selector(), DeviceSelector::touch_screen());
    }

    #[test]
    fn test_app_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.store.match_policy = MatchPolicy::FirstMatch;
        cfg.digitizer.usage_id = 0x02;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
        assert!(toml_str.contains(r#"match_policy = "first-match""#));
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_store_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[store]
key_path = 'SOFTWARE\TouchMap\Test'
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.store.key_path, r"SOFTWARE\TouchMap\Test");
        // Unspecified fields keep their defaults
        assert_eq!(cfg.store.match_policy, MatchPolicy::Strict);
        assert_eq!(cfg.digitizer.usage_page, 0x0D);
    }

    #[test]
    fn test_deserialize_unknown_match_policy_is_parse_error() {
        let result: Result<AppConfig, toml::de::Error> =
            toml::from_str("[store]\nmatch_policy = \"longest\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_from_missing_file_returns_default() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config_from(&path).expect("missing file is not an error");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_from_malformed_file_is_parse_error() {
        // Arrange
        let path = temp_config_path("malformed");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        // Act
        let result = load_config_from(&path);

        // Assert
        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_written_config_loads_back_via_temp_dir() {
        // Arrange
        let path = temp_config_path("round_trip");
        let mut cfg = AppConfig::default();
        cfg.general.log_level = "debug".to_string();
        cfg.compositor.process_name = "dwm".to_string();

        // Act
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, toml::to_string_pretty(&cfg).unwrap()).unwrap();
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped CI env is also acceptable.
    }
}
