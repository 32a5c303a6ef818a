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

// Storage plugin resolution for the recorder
//
// Opens recordings through pluggable storage backends:
// - Backends register by name in a read-only or read-write plugin registry
// - An explicit storage id selects exactly one backend
// - Otherwise backends are auto-detected, gated by file extension when creating
// - Reading falls back to read-write backends opened in read-only mode

pub mod config;
pub mod message;
pub mod proto;
pub mod storage;

// Re-export main types
pub use config::{load_config, load_config_with_env, RecorderStorageConfig};
pub use message::{SerializedMessage, TopicMetadata};
pub use storage::{
    IoMode, ReadOnlyStorage, ReadWriteStorage, Resolution, StorageError, StorageFactory,
    StorageRequest,
};
