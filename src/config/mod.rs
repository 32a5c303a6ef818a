// Configuration module for recorder-storage
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RecorderStorageConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<RecorderStorageConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Let `BAG_URI` and `BAG_STORAGE_ID` override the configured storage target
pub fn apply_env_overrides(config: &mut RecorderStorageConfig) {
    if let Ok(uri) = std::env::var("BAG_URI") {
        config.storage.uri = uri;
    }

    if let Ok(storage_id) = std::env::var("BAG_STORAGE_ID") {
        config.storage.storage_id = Some(storage_id);
    }
}
