// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration types for recorder-storage

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecorderStorageConfig {
    pub storage: StorageSettings,
    #[serde(default)]
    pub plugins: PluginConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to record and which backend to force, if any
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    pub uri: String,

    /// Explicit backend id; empty or missing means auto-detect
    #[serde(default)]
    pub storage_id: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            uri: "/data/recordings/session.rec".to_string(),
            storage_id: None,
        }
    }
}

/// Storage plugins to register, in enumeration order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginConfig {
    #[serde(default = "default_read_write_plugins")]
    pub read_write: Vec<String>,

    #[serde(default = "default_read_only_plugins")]
    pub read_only: Vec<String>,

    #[serde(default)]
    pub filesystem: FilesystemConfig,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            read_write: default_read_write_plugins(),
            read_only: default_read_only_plugins(),
            filesystem: FilesystemConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilesystemConfig {
    /// Suffix of the JSON label sidecar written next to each record
    #[serde(default = "default_metadata_suffix")]
    pub metadata_suffix: String,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            metadata_suffix: default_metadata_suffix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,  // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String,  // "text", "compact", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_read_write_plugins() -> Vec<String> {
    vec!["framed".to_string(), "jsonl".to_string()]
}
fn default_read_only_plugins() -> Vec<String> {
    vec![
        "framed".to_string(),
        "jsonl".to_string(),
        "filesystem".to_string(),
    ]
}
fn default_metadata_suffix() -> String { "meta.json".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
