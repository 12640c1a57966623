//! Run configuration.
//!
//! Configuration is layered: stock defaults are overridden by an optional
//! TOML file, which is in turn overridden by command-line flags.
//!
//! ## Config File Location
//!
//! `--config <file>` if given, otherwise `imgswap.toml` in the current
//! directory when it exists. Without either, stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [pairing]
//! mode = "exhaust"          # exhaust | cycle | replenish | confirm
//! selection = "random"      # random | sequential
//! allow_duplicates = false  # keep matched templates in the pool
//! # seed = 42               # fixed seed for reproducible random picks
//!
//! [files]
//! input_extensions = ["jpg", "jpeg", "png", "bmp", "gif", "tga", "tif", "tiff", "webp", "dds"]
//! template_extensions = ["jpg", "jpeg", "png", "bmp", "gif", "tga", "tif", "tiff", "webp", "dds"]
//! order = "created"         # walk | name | created
//!
//! [backend]
//! kind = "rust"             # rust | magick
//! filter = "lanczos3"
//! identify_command = ["magick", "identify"]
//! convert_command = ["magick"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//!
//! [logging]
//! file = "imgswap.log"
//! level = "info"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::enumerate::FileOrder;
use crate::imaging::ResizeFilter;
use crate::pairing::{PairingMode, Selection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "imgswap.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwapConfig {
    pub pairing: PairingConfig,
    pub files: FilesConfig,
    pub backend: BackendConfig,
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

/// How inputs are matched to templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PairingConfig {
    pub mode: PairingMode,
    pub selection: Selection,
    /// Keep a matched template in the pool so later inputs may reuse it.
    pub allow_duplicates: bool,
    /// Seed for random selection. Absent means a fresh seed per run.
    pub seed: Option<u64>,
}

/// Which files are picked up from the input and template trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    pub input_extensions: Vec<String>,
    pub template_extensions: Vec<String>,
    pub order: FileOrder,
}

const DEFAULT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "gif", "tga", "tif", "tiff", "webp", "dds",
];

impl Default for FilesConfig {
    fn default() -> Self {
        let exts: Vec<String> = DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        Self {
            input_extensions: exts.clone(),
            template_extensions: exts,
            order: FileOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process `image` crate.
    #[default]
    Rust,
    /// ImageMagick command line.
    Magick,
}

/// Image backend selection and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub filter: ResizeFilter,
    /// Command prefix for probing; the ImageMagick backend appends
    /// `-format %wx%h <path>`.
    pub identify_command: Vec<String>,
    /// Command prefix for converting; the ImageMagick backend appends
    /// `<src> -filter F -resize WxH! <dst>`.
    pub convert_command: Vec<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            filter: ResizeFilter::default(),
            identify_command: vec!["magick".to_string(), "identify".to_string()],
            convert_command: vec!["magick".to_string()],
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel conversion workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Per-run log file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("imgswap.log"),
            level: "info".to_string(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl SwapConfig {
    /// Validate config values and normalise extension lists to lowercase
    /// without a leading dot.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        self.files.input_extensions = normalize_extensions(&self.files.input_extensions);
        self.files.template_extensions = normalize_extensions(&self.files.template_extensions);

        if self.files.input_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "files.input_extensions must not be empty".into(),
            ));
        }
        if self.files.template_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "files.template_extensions must not be empty".into(),
            ));
        }
        if self.backend.identify_command.is_empty() || self.backend.convert_command.is_empty() {
            return Err(ConfigError::Validation(
                "backend.identify_command and backend.convert_command must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(self)
    }
}

fn normalize_extensions(exts: &[String]) -> Vec<String> {
    let mut out: Vec<String> = exts
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SwapConfig::default()).expect("default config must serialize")
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

fn read_toml(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Load the run config.
///
/// An explicit path must exist. Without one, `imgswap.toml` in `cwd` is used
/// if present. The file is merged over stock defaults, then validated.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<SwapConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(read_toml(path)?),
        None => {
            let implicit = cwd.join(DEFAULT_CONFIG_FILE);
            if implicit.is_file() {
                Some(read_toml(&implicit)?)
            } else {
                None
            }
        }
    };

    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SwapConfig = merged.try_into()?;
    config.validate()
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgswap configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Pairing
# ---------------------------------------------------------------------------
[pairing]
# exhaust   - each input used once; stop when templates run out
# cycle     - reuse inputs round-robin until every template is filled
# replenish - each input used once; refill the template pool when it empties
# confirm   - like exhaust, but ask before looping templates when inputs
#             outnumber them
mode = "exhaust"

# random or sequential template picks.
selection = "random"

# Keep matched templates in the pool so several inputs may land on one.
allow_duplicates = false

# Fixed seed for random picks (omit for a fresh seed each run).
# seed = 42

# ---------------------------------------------------------------------------
# Files
# ---------------------------------------------------------------------------
[files]
# Case-insensitive extension allow-lists.
input_extensions = ["jpg", "jpeg", "png", "bmp", "gif", "tga", "tif", "tiff", "webp", "dds"]
template_extensions = ["jpg", "jpeg", "png", "bmp", "gif", "tga", "tif", "tiff", "webp", "dds"]

# walk (directory order), name (sorted by path) or created (oldest first).
order = "created"

# ---------------------------------------------------------------------------
# Backend
# ---------------------------------------------------------------------------
[backend]
# rust   - built-in decoder/encoder (cannot write DDS)
# magick - ImageMagick command line
kind = "rust"

# nearest, triangle, catmull-rom, gaussian or lanczos3.
filter = "lanczos3"

# ImageMagick command prefixes. For ImageMagick 6 use ["identify"] and ["convert"].
identify_command = ["magick", "identify"]
convert_command = ["magick"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel conversion workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# Per-run log file with one line per template probe and conversion.
file = "imgswap.log"

# trace, debug, info, warn or error.
level = "info"
"##
}
