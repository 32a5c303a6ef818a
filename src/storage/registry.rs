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

// Plugin registries: enumerate storage backends and construct them by name

use super::backend::{Capability, ReadOnlyStorage, ReadWriteStorage};
use super::error::StorageError;
use super::filesystem::{FilesystemReader, FILESYSTEM_STORAGE_ID};
use super::framed::{FramedFileStorage, FRAMED_EXTENSION, FRAMED_STORAGE_ID};
use super::jsonl::{JsonLinesStorage, JSONL_EXTENSION, JSONL_STORAGE_ID};
use crate::config::PluginConfig;
use tracing::debug;

/// Registered backend as seen during enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub name: String,
    /// Declared file extension, without the leading dot
    pub extension: String,
}

/// Source of backend instances for one capability interface
///
/// `B` is the interface handed out, e.g. `dyn ReadWriteStorage`.
/// Implementations must be safe to share between concurrent resolutions.
pub trait BackendRegistry<B: ?Sized>: Send + Sync {
    /// Capability interface this registry serves
    fn capability(&self) -> Capability;

    /// Registered backends, in the order resolution should try them
    fn enumerate(&self) -> Vec<BackendDescriptor>;

    /// Construct a fresh, unopened instance of the named backend
    fn instantiate(&self, name: &str) -> Result<Box<B>, StorageError>;
}

/// Constructor stored for each registered backend
pub type BackendConstructor<B> = Box<dyn Fn() -> anyhow::Result<Box<B>> + Send + Sync>;

struct PluginEntry<B: ?Sized> {
    descriptor: BackendDescriptor,
    constructor: BackendConstructor<B>,
}

/// Name-to-constructor registry. Enumeration order is registration order.
pub struct PluginRegistry<B: ?Sized> {
    capability: Capability,
    entries: Vec<PluginEntry<B>>,
}

impl<B: ?Sized> PluginRegistry<B> {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            entries: Vec::new(),
        }
    }

    /// Register a backend constructor under `name`
    ///
    /// # Arguments
    /// * `name` - Storage id used for explicit selection
    /// * `extension` - Declared file extension, with or without leading dot
    /// * `constructor` - Builds an unopened instance
    pub fn register<F>(
        &mut self,
        name: impl Into<String>,
        extension: impl Into<String>,
        constructor: F,
    ) -> Result<(), StorageError>
    where
        F: Fn() -> anyhow::Result<Box<B>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.contains(&name) {
            return Err(StorageError::DuplicateBackend { backend: name });
        }

        let extension = extension.into();
        let extension = extension
            .strip_prefix('.')
            .map(str::to_string)
            .unwrap_or(extension);

        debug!(
            "Registered {} storage plugin '{}' (extension '{}')",
            self.capability, name, extension
        );

        self.entries.push(PluginEntry {
            descriptor: BackendDescriptor { name, extension },
            constructor: Box::new(constructor),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.descriptor.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<B: ?Sized> BackendRegistry<B> for PluginRegistry<B> {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn enumerate(&self) -> Vec<BackendDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    fn instantiate(&self, name: &str) -> Result<Box<B>, StorageError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.descriptor.name == name)
            .ok_or_else(|| StorageError::BackendNotRegistered {
                backend: name.to_string(),
            })?;

        (entry.constructor)().map_err(|e| StorageError::InstantiationFailed {
            backend: name.to_string(),
            message: format!("{:#}", e),
        })
    }
}

/// Build the read-write registry from the configured plugin names
///
/// Unknown names make the registry unavailable.
pub fn builtin_read_write_registry(
    config: &PluginConfig,
) -> Result<PluginRegistry<dyn ReadWriteStorage>, StorageError> {
    let mut registry = PluginRegistry::new(Capability::ReadWrite);

    for name in &config.read_write {
        match name.as_str() {
            FRAMED_STORAGE_ID => {
                registry.register(FRAMED_STORAGE_ID, FRAMED_EXTENSION, || {
                    let backend: Box<dyn ReadWriteStorage> = Box::new(FramedFileStorage::new());
                    Ok(backend)
                })?
            }
            JSONL_STORAGE_ID => registry.register(JSONL_STORAGE_ID, JSONL_EXTENSION, || {
                let backend: Box<dyn ReadWriteStorage> = Box::new(JsonLinesStorage::new());
                Ok(backend)
            })?,
            unknown => {
                return Err(StorageError::RegistryUnavailable(format!(
                    "unknown read-write storage plugin '{}'. Supported: {}, {}",
                    unknown, FRAMED_STORAGE_ID, JSONL_STORAGE_ID
                )))
            }
        }
    }

    Ok(registry)
}

/// Build the read-only registry from the configured plugin names
pub fn builtin_read_only_registry(
    config: &PluginConfig,
) -> Result<PluginRegistry<dyn ReadOnlyStorage>, StorageError> {
    let mut registry = PluginRegistry::new(Capability::ReadOnly);

    for name in &config.read_only {
        match name.as_str() {
            FRAMED_STORAGE_ID => {
                registry.register(FRAMED_STORAGE_ID, FRAMED_EXTENSION, || {
                    let backend: Box<dyn ReadOnlyStorage> = Box::new(FramedFileStorage::new());
                    Ok(backend)
                })?
            }
            JSONL_STORAGE_ID => registry.register(JSONL_STORAGE_ID, JSONL_EXTENSION, || {
                let backend: Box<dyn ReadOnlyStorage> = Box::new(JsonLinesStorage::new());
                Ok(backend)
            })?,
            FILESYSTEM_STORAGE_ID => {
                let filesystem = config.filesystem.clone();
                registry.register(FILESYSTEM_STORAGE_ID, "", move || {
                    let backend: Box<dyn ReadOnlyStorage> =
                        Box::new(FilesystemReader::new(filesystem.clone()));
                    Ok(backend)
                })?
            }
            unknown => {
                return Err(StorageError::RegistryUnavailable(format!(
                    "unknown read-only storage plugin '{}'. Supported: {}, {}, {}",
                    unknown, FRAMED_STORAGE_ID, JSONL_STORAGE_ID, FILESYSTEM_STORAGE_ID
                )))
            }
        }
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn names(registry: &dyn BackendRegistry<dyn ReadOnlyStorage>) -> Vec<String> {
        registry.enumerate().into_iter().map(|d| d.name).collect()
    }

    #[test]
    fn test_builtin_registries_follow_config_order() {
        let config = PluginConfig {
            read_only: vec!["filesystem".to_string(), "jsonl".to_string()],
            ..PluginConfig::default()
        };

        let registry = builtin_read_only_registry(&config).unwrap();
        assert_eq!(names(&registry), vec!["filesystem", "jsonl"]);

        let registry = builtin_read_write_registry(&config).unwrap();
        let descriptors = registry.enumerate();
        assert_eq!(descriptors[0].name, "framed");
        assert_eq!(descriptors[0].extension, "rec");
        assert_eq!(descriptors[1].name, "jsonl");
        assert_eq!(descriptors[1].extension, "jsonl");
    }

    #[test]
    fn test_unknown_plugin_is_fatal() {
        let config = PluginConfig {
            read_write: vec!["sqlite3".to_string()],
            ..PluginConfig::default()
        };

        let result = builtin_read_write_registry(&config);
        assert!(matches!(
            result,
            Err(StorageError::RegistryUnavailable(ref msg)) if msg.contains("sqlite3")
        ));
    }

    #[test]
    fn test_filesystem_is_read_only() {
        let config = PluginConfig {
            read_write: vec!["filesystem".to_string()],
            ..PluginConfig::default()
        };
        assert!(builtin_read_write_registry(&config).is_err());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry: PluginRegistry<dyn ReadOnlyStorage> =
            PluginRegistry::new(Capability::ReadOnly);
        registry
            .register("framed", "rec", || {
                let backend: Box<dyn ReadOnlyStorage> = Box::new(FramedFileStorage::new());
                Ok(backend)
            })
            .unwrap();

        let result = registry.register("framed", ".rec", || bail!("never called"));
        assert!(matches!(result, Err(StorageError::DuplicateBackend { .. })));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_leading_dot_is_stripped() {
        let mut registry: PluginRegistry<dyn ReadOnlyStorage> =
            PluginRegistry::new(Capability::ReadOnly);
        registry
            .register("framed", ".rec", || bail!("not needed"))
            .unwrap();
        assert_eq!(registry.enumerate()[0].extension, "rec");
    }

    #[test]
    fn test_instantiate_errors() {
        let mut registry: PluginRegistry<dyn ReadOnlyStorage> =
            PluginRegistry::new(Capability::ReadOnly);
        registry
            .register("broken", "rec", || bail!("missing shared state"))
            .unwrap();

        match registry.instantiate("broken") {
            Err(StorageError::InstantiationFailed { backend, message }) => {
                assert_eq!(backend, "broken");
                assert!(message.contains("missing shared state"));
            }
            _ => panic!("expected instantiation failure"),
        }

        assert!(matches!(
            registry.instantiate("absent"),
            Err(StorageError::BackendNotRegistered { .. })
        ));
    }
}
