// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["text", "compact", "json"];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file with environment variable substitution
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RecorderStorageConfig> {
        let content = std::fs::read_to_string(path.as_ref())
            .context("Failed to read config file")?;

        Self::parse(&content)
    }

    /// Parse YAML text, substituting environment variables first
    pub fn parse(content: &str) -> Result<RecorderStorageConfig> {
        let content = Self::substitute_env_vars(content);

        let config: RecorderStorageConfig = serde_yaml::from_str(&content)
            .context("Failed to parse YAML configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Substitute ${VAR} and ${VAR:-default} patterns with environment variables
    ///
    /// Examples:
    /// - ${HOME} -> /home/user
    /// - ${BAG_URI:-/data/session.rec} -> /data/session.rec (if BAG_URI not set)
    fn substitute_env_vars(content: &str) -> String {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("valid env var pattern")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str());

            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match default_value {
                    Some(default) => default.to_string(),
                    // Keep original if no default and var not found
                    None => format!("${{{}}}", var_name),
                },
            }
        })
        .to_string()
    }

    /// Validate configuration
    pub(crate) fn validate(config: &RecorderStorageConfig) -> Result<()> {
        if config.storage.uri.trim().is_empty() {
            bail!("storage.uri cannot be empty");
        }

        let plugins = &config.plugins;
        if plugins.read_write.is_empty() && plugins.read_only.is_empty() {
            bail!("plugins: at least one read_write or read_only plugin is required");
        }

        for (list, names) in [("read_write", &plugins.read_write), ("read_only", &plugins.read_only)] {
            let mut seen = HashSet::new();
            for name in names {
                if !seen.insert(name.as_str()) {
                    bail!("plugins.{} lists '{}' more than once", list, name);
                }
            }
        }

        if plugins.filesystem.metadata_suffix.is_empty() {
            bail!("plugins.filesystem.metadata_suffix cannot be empty");
        }

        if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
            bail!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                config.logging.level
            );
        }

        if !LOG_FORMATS.contains(&config.logging.format.to_lowercase().as_str()) {
            bail!(
                "logging.format must be one of {}, got '{}'",
                LOG_FORMATS.join(", "),
                config.logging.format
            );
        }

        Ok(())
    }
}
