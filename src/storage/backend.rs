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

// Storage capability interfaces

use super::request::StorageRequest;
use crate::message::{SerializedMessage, TopicMetadata};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

/// Mode a backend is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoMode {
    ReadOnly,
    ReadWrite,
}

impl fmt::Display for IoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoMode::ReadOnly => write!(f, "read-only"),
            IoMode::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// Capability interface a registry hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ReadOnly,
    ReadWrite,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ReadOnly => write!(f, "read-only"),
            Capability::ReadWrite => write!(f, "read-write"),
        }
    }
}

/// Contract shared by every storage backend
///
/// A freshly instantiated backend is inert until `open` succeeds. The
/// resolver never hands out an instance whose `open` failed.
#[async_trait]
pub trait BaseStorage: Send + Sync {
    /// Identifier the backend is registered under ("framed", "jsonl", ...)
    fn storage_identifier(&self) -> &str;

    /// File extension this backend writes, without the leading dot.
    /// Empty for backends that do not own a single file.
    fn file_extension(&self) -> &str;

    /// Open the storage at the request's location
    ///
    /// # Arguments
    /// * `request` - Location and optional backend id
    /// * `io_mode` - `ReadWrite` creates the storage, `ReadOnly` must never write
    async fn open(&mut self, request: &StorageRequest, io_mode: IoMode) -> Result<()>;
}

/// Backends that can read an existing recording
#[async_trait]
pub trait ReadOnlyStorage: BaseStorage {
    /// Path of the opened storage relative to its parent directory
    fn relative_file_path(&self) -> Option<String>;

    /// Topics known to the opened storage
    fn topics(&self) -> Vec<TopicMetadata>;

    /// Whether another message is available
    async fn has_next(&mut self) -> Result<bool>;

    /// Read the next message in timestamp order, `None` when exhausted
    async fn read_next(&mut self) -> Result<Option<SerializedMessage>>;
}

/// Backends that can also create and append to a recording
#[async_trait]
pub trait ReadWriteStorage: ReadOnlyStorage {
    /// Register a topic before writing messages on it
    async fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()>;

    /// Append a message
    async fn write(&mut self, message: &SerializedMessage) -> Result<()>;

    /// Hand this backend out through the read-only interface
    fn into_read_only(self: Box<Self>) -> Box<dyn ReadOnlyStorage>;
}
