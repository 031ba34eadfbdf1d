//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory)
//! and applying command-line surface overrides on top.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use cumulus::{
    CumulusError,
    config::{AppConfig, SurfaceConfig},
};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for CumulusError {
    fn from(err: ConfigError) -> Self {
        CumulusError::Config(err.to_string())
    }
}

/// Surface values given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceOverrides {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub density: Option<f32>,
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (cumulus/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, CumulusError> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Try the local project directory
    let local_config = Path::new("cumulus/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("com", "cumulus", "cumulus") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    // 4. If no config is found, return default config
    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Replace surface settings with the ones given on the command line and
/// validate the result.
///
/// # Errors
///
/// Returns a validation error if the combined configuration is unusable.
pub fn apply_overrides(
    config: AppConfig,
    overrides: SurfaceOverrides,
) -> Result<AppConfig, CumulusError> {
    let surface = *config.surface();
    let surface = SurfaceConfig::new(
        overrides.width.unwrap_or(surface.width()),
        overrides.height.unwrap_or(surface.height()),
        overrides.density.unwrap_or(surface.density()),
    );
    let config = config.with_surface(surface);

    config.validate().map_err(ConfigError::Validation)?;
    debug!(
        width = surface.width(),
        height = surface.height(),
        density = surface.density();
        "Surface configured"
    );
    Ok(config)
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, CumulusError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok(config)
}
