//! Pad configuration: TOML file + CLI overrides.

use anyhow::{bail, Context, Result};
use leftpad_core::config::{DEFAULT_BUFFER_SIZE, DEFAULT_WIDTH};
use leftpad_core::DeviceParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub pad: PadSection,
}

/// `[pad]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct PadSection {
    #[serde(default = "default_width")]
    pub width: usize,
    /// A single ASCII character.
    #[serde(default = "default_fill")]
    pub fill: String,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for PadSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            fill: default_fill(),
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_width() -> usize {
    DEFAULT_WIDTH
}
fn default_fill() -> String {
    " ".to_string()
}
fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

impl ConfigFile {
    /// Load a config file, returning defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let expanded = expand_tilde(path);
        if !expanded.exists() {
            debug!(path = %expanded.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        info!(path = %expanded.display(), "loading config file");
        let content = std::fs::read_to_string(&expanded)
            .with_context(|| format!("cannot read config {}", expanded.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("config parse error in {}", expanded.display()))
    }
}

/// Resolve device parameters from the config file, then apply CLI overrides.
///
/// Range checks on width and fill happen when the device is created.
pub fn resolve(
    config_path: &Path,
    cli_width: Option<usize>,
    cli_fill: Option<&str>,
    cli_buffer_size: Option<usize>,
) -> Result<DeviceParams> {
    let file = ConfigFile::load(config_path)?;
    let fill = parse_fill(cli_fill.unwrap_or(&file.pad.fill))?;
    Ok(DeviceParams {
        buffer_size: cli_buffer_size.unwrap_or(file.pad.buffer_size),
        width: cli_width.unwrap_or(file.pad.width),
        fill,
    })
}

/// Parse a fill given as exactly one character.
pub fn parse_fill(s: &str) -> Result<u8> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => bail!("fill must be a single ASCII character, got {s:?}"),
    }
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
