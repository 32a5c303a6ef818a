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

// Backend resolution: pick, instantiate and open exactly one backend
//
// Candidates are tried strictly one after another. A backend opened in
// read-write mode may create files, so no two candidates ever touch the
// same location concurrently.

use super::backend::{BaseStorage, IoMode};
use super::error::{Diagnostic, StorageError};
use super::extension::{extension_of, matches_extension};
use super::registry::{BackendDescriptor, BackendRegistry};
use super::request::StorageRequest;
use tracing::{debug, error, info, warn};

/// Outcome of one resolution
///
/// `instance` is only ever set to a backend whose `open` succeeded.
/// `diagnostics` lists every recovered failure in the order it happened.
pub struct Resolution<B: ?Sized> {
    pub instance: Option<Box<B>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<B: ?Sized> Resolution<B> {
    fn empty() -> Self {
        Self {
            instance: None,
            diagnostics: Vec::new(),
        }
    }

    fn record(&mut self, error: &StorageError) {
        self.diagnostics.push(Diagnostic::from(error));
    }

    pub fn is_resolved(&self) -> bool {
        self.instance.is_some()
    }

    pub fn into_instance(self) -> Option<Box<B>> {
        self.instance
    }

    /// Convert the opened instance to another interface, keeping diagnostics
    pub fn map<C: ?Sized>(self, f: impl FnOnce(Box<B>) -> Box<C>) -> Resolution<C> {
        Resolution {
            instance: self.instance.map(f),
            diagnostics: self.diagnostics,
        }
    }

    /// Prepend the diagnostics of an earlier, failed attempt
    pub(crate) fn after(mut self, earlier: Vec<Diagnostic>) -> Self {
        let mut diagnostics = earlier;
        diagnostics.append(&mut self.diagnostics);
        self.diagnostics = diagnostics;
        self
    }
}

/// Resolve `request` against `registry`, opening the winner with `io_mode`
///
/// With an explicit backend id only that backend is ever instantiated.
/// Otherwise every registered backend is tried in enumeration order and
/// the first one that opens wins. In `ReadWrite` mode candidates whose
/// declared extension differs from the location's are skipped without
/// being instantiated.
pub async fn resolve<B, R>(registry: &R, request: &StorageRequest, io_mode: IoMode) -> Resolution<B>
where
    B: BaseStorage + ?Sized,
    R: BackendRegistry<B> + ?Sized,
{
    let descriptors = registry.enumerate();
    debug!(
        "There are {} {} storage plugins",
        descriptors.len(),
        registry.capability()
    );

    match request.explicit_backend_id() {
        Some(backend_id) => {
            open_explicit(registry, &descriptors, backend_id, request, io_mode).await
        }
        None => detect_and_open(registry, &descriptors, request, io_mode).await,
    }
}

async fn open_explicit<B, R>(
    registry: &R,
    descriptors: &[BackendDescriptor],
    backend_id: &str,
    request: &StorageRequest,
    io_mode: IoMode,
) -> Resolution<B>
where
    B: BaseStorage + ?Sized,
    R: BackendRegistry<B> + ?Sized,
{
    let mut resolution = Resolution::empty();

    if !descriptors.iter().any(|d| d.name == backend_id) {
        let err = StorageError::BackendNotRegistered {
            backend: backend_id.to_string(),
        };
        warn!("{}", err);
        resolution.record(&err);
        return resolution;
    }

    match open_candidate(registry, backend_id, request, io_mode).await {
        Ok(instance) => resolution.instance = Some(instance),
        Err(err) => {
            error!("{}", err);
            resolution.record(&err);
        }
    }

    resolution
}

async fn detect_and_open<B, R>(
    registry: &R,
    descriptors: &[BackendDescriptor],
    request: &StorageRequest,
    io_mode: IoMode,
) -> Resolution<B>
where
    B: BaseStorage + ?Sized,
    R: BackendRegistry<B> + ?Sized,
{
    let mut resolution = Resolution::empty();
    let location = request.location();

    // Creating a file "just to try" would succeed with the wrong format,
    // so read-write detection only considers matching extensions.
    let use_extension = io_mode == IoMode::ReadWrite;

    info!(
        "Trying to open '{}' {} (extension '{}')",
        location,
        io_mode,
        extension_of(location)
    );

    for descriptor in descriptors {
        if use_extension && !matches_extension(location, &descriptor.extension) {
            debug!(
                "Skipping storage implementation '{}': extension '{}' does not match",
                descriptor.name, descriptor.extension
            );
            continue;
        }

        info!(
            "Checking storage implementation '{}' to open '{}'",
            descriptor.name, location
        );

        match open_candidate(registry, &descriptor.name, request, io_mode).await {
            Ok(instance) => {
                info!(
                    "Opened '{}' with storage implementation '{}'",
                    location, descriptor.name
                );
                resolution.instance = Some(instance);
                return resolution;
            }
            Err(err) => {
                error!("{}", err);
                resolution.record(&err);
            }
        }
    }

    let err = StorageError::ResolutionExhausted {
        location: location.to_string(),
    };
    warn!("{}", err);
    resolution.record(&err);
    resolution
}

/// Instantiate and open one candidate. A failed instance is dropped here.
async fn open_candidate<B, R>(
    registry: &R,
    name: &str,
    request: &StorageRequest,
    io_mode: IoMode,
) -> Result<Box<B>, StorageError>
where
    B: BaseStorage + ?Sized,
    R: BackendRegistry<B> + ?Sized,
{
    let mut instance = registry.instantiate(name)?;

    instance
        .open(request, io_mode)
        .await
        .map_err(|e| StorageError::OpenFailed {
            backend: name.to_string(),
            location: request.location().to_string(),
            message: format!("{:#}", e),
        })?;

    Ok(instance)
}
