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

// Storage backend module
//
// Backends implement one or both capability interfaces (read-only,
// read-write) and are registered by name in a plugin registry per
// interface. The factory resolves a request to exactly one opened
// backend, auto-detecting it when no storage id is given.

pub mod backend;
mod create;
pub mod error;
pub mod extension;
pub mod factory;
pub mod filesystem;
pub mod framed;
pub mod jsonl;
pub mod registry;
pub mod request;
pub mod resolver;

pub use backend::{BaseStorage, Capability, IoMode, ReadOnlyStorage, ReadWriteStorage};
pub use error::{Diagnostic, ResolutionErrorKind, StorageError};
pub use extension::{extension_of, matches_extension};
pub use factory::StorageFactory;
pub use filesystem::FilesystemReader;
pub use framed::FramedFileStorage;
pub use jsonl::JsonLinesStorage;
pub use registry::{BackendDescriptor, BackendRegistry, PluginRegistry};
pub use request::StorageRequest;
pub use resolver::{resolve, Resolution};
