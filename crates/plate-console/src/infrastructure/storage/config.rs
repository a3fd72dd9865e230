//! TOML-based configuration persistence for the console.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\PlateConsole\config.toml`
//! - Linux:    `~/.config/plateconsole/config.toml`
//! - macOS:    `~/Library/Application Support/PlateConsole/config.toml`
//!
//! # What is TOML? (for beginners)
//!
//! TOML (Tom's Obvious Minimal Language) is a configuration file format designed
//! to be easy to read and write.  Example:
//!
//! ```toml
//! [console]
//! operator = "Shift lead"
//! page_size = 20
//!
//! [diagram]
//! margin_y = 120.0
//! label_chunk = 8
//! ```
//!
//! # Serde default values
//!
//! Every field is annotated with `#[serde(default = "some_fn")]`, so a file
//! holding only the settings the operator changed is complete, and the
//! console works on first run before any file exists.

use std::path::PathBuf;

use plate_core::{Viewport, DEFAULT_LABEL_CHUNK};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::paginate::{normalize_page_size, DEFAULT_PAGE_SIZE};
use crate::application::position_diagram::DiagramOptions;

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

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub diagram: DiagramConfig,
}

/// General console behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsoleConfig {
    /// Schema version string – bump when breaking changes are introduced.
    #[serde(default = "default_version")]
    pub version: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Name recorded as the changer when an adjustment names nobody.
    #[serde(default = "default_operator")]
    pub operator: String,
    /// Rows per table page; one of 10, 20, 50, 100.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

/// Where the data documents live.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Overrides the data directory; defaults to `<config dir>/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

/// Position diagram sizing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagramConfig {
    /// Horizontal space outside the grid (dialog paddings, scrollbar).
    #[serde(default = "default_margin_x")]
    pub margin_x: f64,
    /// Vertical space outside the grid (title, legend, footer).
    #[serde(default = "default_margin_y")]
    pub margin_y: f64,
    /// Window size assumed when the caller does not pass one.
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
    /// Characters per label line; 0 disables wrapping.
    #[serde(default = "default_label_chunk")]
    pub label_chunk: usize,
}

impl DiagramConfig {
    /// Diagram options for `viewport`, or the configured default viewport.
    pub fn options(&self, viewport: Option<Viewport>) -> DiagramOptions {
        DiagramOptions {
            viewport: viewport
                .unwrap_or_else(|| Viewport::new(self.viewport_width, self.viewport_height)),
            margin_x: self.margin_x,
            margin_y: self.margin_y,
            label_chunk: self.label_chunk,
        }
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_version() -> String {
    "1.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_operator() -> String {
    "System user".to_string()
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_margin_x() -> f64 {
    48.0
}
fn default_margin_y() -> f64 {
    160.0
}
fn default_viewport_width() -> f64 {
    1280.0
}
fn default_viewport_height() -> f64 {
    800.0
}
fn default_label_chunk() -> usize {
    DEFAULT_LABEL_CHUNK
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
            operator: default_operator(),
            page_size: default_page_size(),
        }
    }
}

impl ConsoleConfig {
    /// The configured page size, or the default if it is not an offered size.
    pub fn effective_page_size(&self) -> usize {
        normalize_page_size(self.page_size)
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            margin_x: default_margin_x(),
            margin_y: default_margin_y(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            label_chunk: default_label_chunk(),
        }
    }
}

impl AppConfig {
    /// Directory holding the data documents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformConfigDir`] when no override is set
    /// and the platform directory cannot be determined.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("data")),
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
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
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

/// Loads `AppConfig` from an explicit path.  A missing file yields defaults.
pub fn load_config_from(path: &std::path::Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to the platform config file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Persists `config` to an explicit path, creating parent directories.
pub fn save_config_to(config: &AppConfig, path: &std::path::Path) -> Result<(), ConfigError> {
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

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("PlateConsole"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("plateconsole"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("PlateConsole")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
