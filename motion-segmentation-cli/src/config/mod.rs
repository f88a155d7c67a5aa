use anyhow::{Context, Result};
use motion_segmentation::config::{Config, DEFAULT_CONFIG};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Builtin => write!(f, "built-in defaults"),
        }
    }
}

/// Get config directory path (~/.motion-segmentation/)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".motion-segmentation"))
}

/// Get config file path (~/.motion-segmentation/config.toml)
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Pick the configuration file to use
///
/// An explicit path (flag or `MOTION_SEG_CONFIG`) must exist. Otherwise the
/// user config file is used when present, then the built-in defaults.
pub fn resolve(explicit: Option<&Path>, user_file: Option<PathBuf>) -> Result<ConfigSource> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(ConfigSource::File(path.to_path_buf()));
    }

    match user_file {
        Some(path) if path.exists() => Ok(ConfigSource::File(path)),
        _ => Ok(ConfigSource::Builtin),
    }
}

/// Load and validate the configuration from `source`
pub fn load_from(source: &ConfigSource) -> Result<Config> {
    let config = match source {
        ConfigSource::File(path) => Config::load(path)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?,
        ConfigSource::Builtin => Config::builtin().context("Built-in configuration is invalid")?,
    };
    Ok(config)
}

/// Resolve and load in one step
pub fn load(explicit: Option<&Path>) -> Result<(Config, ConfigSource)> {
    let source = resolve(explicit, config_file().ok())?;
    tracing::debug!("Using configuration from {}", source);
    let config = load_from(&source)?;
    Ok((config, source))
}

/// Write the default configuration to `path`
pub fn write_default(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    fs::write(path, DEFAULT_CONFIG).context("Failed to write config file")?;
    Ok(())
}
