//! Server configuration module.
//!
//! Handles loading, validating, and layering configuration. The resolved
//! [`ServerConfig`] is built once at startup, then shared read-only by the
//! resolver, the request pipeline and the HTTP layer.
//!
//! ## Layers
//!
//! Later layers override earlier ones, key by key:
//!
//! ```text
//! stock defaults               (ServerConfig::default)
//!   ← iiif.toml                (or the file given with --config)
//!     ← environment / CLI      (FILE_LOCATIONS, SITE_URI, --root, --base-uri, --bind)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! base_uri = "http://localhost/"   # Prefix for `@id` in info.json; must end with '/'
//! search_roots = ["."]             # Directories searched for images, in order
//!
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [encoding]
//! jpeg_quality = 95                # 1-100
//!
//! [processing]
//! max_processes = 4                # Max parallel workers (omit for auto = CPU cores)
//!
//! [limits]
//! max_width = 10000                # Largest output side in pixels (width and height)
//! max_area = 50000000              # Largest output pixel count
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::geometry::OutputLimits;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "iiif.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Process-wide server configuration.
///
/// All fields have sensible defaults. Config files need only specify the
/// values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Prefix for image identifiers, e.g. `http://localhost/`.
    pub base_uri: String,
    /// Directories searched for images, in priority order.
    pub search_roots: Vec<PathBuf>,
    /// HTTP listener settings.
    pub server: HttpConfig,
    /// Output encoding settings.
    pub encoding: EncodingConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Output size limits.
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_uri: "http://localhost/".to_string(),
            search_roots: vec![PathBuf::from(".")],
            server: HttpConfig::default(),
            encoding: EncodingConfig::default(),
            processing: ProcessingConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_uri.is_empty() || !self.base_uri.ends_with('/') {
            return Err(ConfigError::Validation(
                "base_uri must be non-empty and end with '/'".into(),
            ));
        }
        if self.search_roots.is_empty() {
            return Err(ConfigError::Validation(
                "search_roots must not be empty".into(),
            ));
        }
        if !(1..=100).contains(&self.encoding.jpeg_quality) {
            return Err(ConfigError::Validation(
                "encoding.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.limits.max_width == 0 || self.limits.max_area == 0 {
            return Err(ConfigError::Validation(
                "limits.max_width and limits.max_area must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
        }
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Output size limits, advertised in info.json and enforced per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest output width. Also bounds the height.
    pub max_width: u32,
    /// Largest output area in pixels.
    pub max_area: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = OutputLimits::default();
        Self {
            max_width: limits.max_width,
            max_area: limits.max_area,
        }
    }
}

impl LimitsConfig {
    pub fn output_limits(&self) -> OutputLimits {
        OutputLimits {
            max_width: self.max_width,
            max_area: self.max_area,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Values given on the command line or through the environment.
///
/// `None` means "not given"; the lower layers decide.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub search_roots: Option<Vec<PathBuf>>,
    pub base_uri: Option<String>,
    pub bind: Option<SocketAddr>,
}

impl ConfigOverrides {
    /// Express the overrides as a sparse TOML table for merging.
    pub fn to_toml(&self) -> Result<Option<toml::Value>, ConfigError> {
        let mut table = toml::Table::new();
        if let Some(roots) = &self.search_roots {
            table.insert("search_roots".into(), toml::Value::try_from(roots)?);
        }
        if let Some(uri) = &self.base_uri {
            table.insert("base_uri".into(), toml::Value::String(uri.clone()));
        }
        if let Some(bind) = &self.bind {
            let mut server = toml::Table::new();
            server.insert("bind".into(), toml::Value::String(bind.to_string()));
            table.insert("server".into(), toml::Value::Table(server));
        }
        Ok((!table.is_empty()).then_some(toml::Value::Table(table)))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ServerConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge the overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = Option<toml::Value>>,
) -> Result<ServerConfig, ConfigError> {
    let merged = overlays.into_iter().flatten().fold(base, merge_toml);
    let config: ServerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the full configuration.
///
/// An explicitly given `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`]
/// in the working directory is used if present.
pub fn load_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ServerConfig, ConfigError> {
    let file_layer = match path {
        Some(p) => Some(load_raw_config(p)?.ok_or_else(|| ConfigError::NotFound(p.to_path_buf()))?),
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value()?, [file_layer, overrides.to_toml()?])
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# IIIF Server Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Environment variables and command-line flags override this file:
#   FILE_LOCATIONS / --root      -> search_roots
#   SITE_URI       / --base-uri  -> base_uri
#                    --bind      -> server.bind
#
# Unknown keys will cause an error.

# Prefix for the "@id" of every image. Must end with '/'.
base_uri = "http://localhost/"

# Directories searched (recursively) for requested filenames, in order.
# When two directories contain a file with the same name, the first found wins.
search_roots = ["."]

# ---------------------------------------------------------------------------
# HTTP listener
# ---------------------------------------------------------------------------
[server]
bind = "127.0.0.1:8000"

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[encoding]
# JPEG quality (1 = worst, 100 = best).
jpeg_quality = 95

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Output limits (advertised as maxWidth / maxArea in info.json)
# ---------------------------------------------------------------------------
[limits]
# Largest width or height of a rendered image, in pixels.
max_width = 10000
# Largest number of pixels in a rendered image.
max_area = 50000000
"##
}
