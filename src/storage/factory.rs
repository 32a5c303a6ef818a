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

// Storage factory: public entry point for opening recordings

use super::backend::{IoMode, ReadOnlyStorage, ReadWriteStorage};
use super::error::StorageError;
use super::registry::{builtin_read_only_registry, builtin_read_write_registry, BackendRegistry};
use super::request::StorageRequest;
use super::resolver::{resolve, Resolution};
use crate::config::PluginConfig;
use std::sync::Arc;
use tracing::{error, info};

pub type ReadOnlyRegistry = dyn BackendRegistry<dyn ReadOnlyStorage>;
pub type ReadWriteRegistry = dyn BackendRegistry<dyn ReadWriteStorage>;

/// Opens storage backends for reading or writing
///
/// Holds one registry per capability interface. Both open operations are
/// total: a failure to find a backend is reported as `None` (plus log
/// records), never as an error.
#[derive(Clone)]
pub struct StorageFactory {
    read_only: Arc<ReadOnlyRegistry>,
    read_write: Arc<ReadWriteRegistry>,
}

impl StorageFactory {
    pub fn new(read_only: Arc<ReadOnlyRegistry>, read_write: Arc<ReadWriteRegistry>) -> Self {
        Self {
            read_only,
            read_write,
        }
    }

    /// Build both registries from plugin configuration
    ///
    /// Fails if either registry cannot be built; without a registry no
    /// request could ever be resolved.
    pub fn from_config(config: &PluginConfig) -> Result<Self, StorageError> {
        let read_write = builtin_read_write_registry(config).map_err(|e| {
            error!("Unable to create read-write plugin registry: {}", e);
            e
        })?;

        let read_only = builtin_read_only_registry(config).map_err(|e| {
            error!("Unable to create read-only plugin registry: {}", e);
            e
        })?;

        info!(
            "Storage factory ready with {} read-only and {} read-write plugins",
            read_only.len(),
            read_write.len()
        );

        Ok(Self::new(Arc::new(read_only), Arc::new(read_write)))
    }

    /// Factory with every built-in backend in its default order
    pub fn with_builtin_backends() -> Result<Self, StorageError> {
        Self::from_config(&PluginConfig::default())
    }

    /// Resolve a backend for writing, keeping the diagnostics
    pub async fn resolve_read_write(
        &self,
        request: &StorageRequest,
    ) -> Resolution<dyn ReadWriteStorage> {
        resolve(self.read_write.as_ref(), request, IoMode::ReadWrite).await
    }

    /// Open (and create) storage for writing. No fallback.
    pub async fn open_read_write(
        &self,
        request: &StorageRequest,
    ) -> Option<Box<dyn ReadWriteStorage>> {
        let instance = self.resolve_read_write(request).await.into_instance();

        if instance.is_none() {
            error!(
                "Could not load/open plugin with storage id '{}'.",
                request.explicit_backend_id().unwrap_or_default()
            );
        }

        instance
    }

    /// Resolve a backend for reading, keeping the diagnostics
    ///
    /// Read-only backends are tried first. If none opens the location the
    /// read-write registry is tried in read-only mode; diagnostics of both
    /// attempts are kept in order.
    pub async fn resolve_read_only(
        &self,
        request: &StorageRequest,
    ) -> Resolution<dyn ReadOnlyStorage> {
        let resolution = resolve(self.read_only.as_ref(), request, IoMode::ReadOnly).await;
        if resolution.is_resolved() {
            return resolution;
        }

        info!(
            "No read-only plugin opened '{}', trying read-write plugins in read-only mode",
            request.location()
        );

        resolve(self.read_write.as_ref(), request, IoMode::ReadOnly)
            .await
            .map(|instance| instance.into_read_only())
            .after(resolution.diagnostics)
    }

    /// Open existing storage for reading
    pub async fn open_read_only(
        &self,
        request: &StorageRequest,
    ) -> Option<Box<dyn ReadOnlyStorage>> {
        let instance = self.resolve_read_only(request).await.into_instance();

        if instance.is_none() {
            error!(
                "Could not load/open plugin with storage id '{}'.",
                request.explicit_backend_id().unwrap_or_default()
            );
        }

        instance
    }
}
