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

// Mock storage backends that record every instantiate/open call

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use recorder_storage::storage::{
    BaseStorage, Capability, IoMode, PluginRegistry, ReadOnlyStorage, ReadWriteStorage,
    StorageRequest,
};
use recorder_storage::{SerializedMessage, TopicMetadata};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Instantiated(String),
    Opened(String, IoMode),
}

/// Shared, ordered record of backend calls
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn instantiated(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Instantiated(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Opened(name, _) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn open_modes(&self) -> Vec<IoMode> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Opened(_, mode) => Some(mode),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// How a mock backend behaves
#[derive(Debug, Clone)]
pub struct MockSpec {
    pub name: String,
    pub extension: String,
    pub instantiates: bool,
    pub opens: bool,
}

pub fn mock(name: &str, extension: &str) -> MockSpec {
    MockSpec {
        name: name.to_string(),
        extension: extension.to_string(),
        instantiates: true,
        opens: true,
    }
}

impl MockSpec {
    pub fn failing_open(mut self) -> Self {
        self.opens = false;
        self
    }

    pub fn failing_instantiation(mut self) -> Self {
        self.instantiates = false;
        self
    }
}

pub struct MockBackend {
    spec: MockSpec,
    log: CallLog,
    mode: Option<IoMode>,
}

#[async_trait]
impl BaseStorage for MockBackend {
    fn storage_identifier(&self) -> &str {
        &self.spec.name
    }

    fn file_extension(&self) -> &str {
        &self.spec.extension
    }

    async fn open(&mut self, request: &StorageRequest, io_mode: IoMode) -> Result<()> {
        self.log.push(Call::Opened(self.spec.name.clone(), io_mode));
        if !self.spec.opens {
            bail!("{} cannot open {}", self.spec.name, request.location());
        }
        self.mode = Some(io_mode);
        Ok(())
    }
}

#[async_trait]
impl ReadOnlyStorage for MockBackend {
    fn relative_file_path(&self) -> Option<String> {
        None
    }

    fn topics(&self) -> Vec<TopicMetadata> {
        Vec::new()
    }

    async fn has_next(&mut self) -> Result<bool> {
        Ok(false)
    }

    async fn read_next(&mut self) -> Result<Option<SerializedMessage>> {
        Ok(None)
    }
}

#[async_trait]
impl ReadWriteStorage for MockBackend {
    async fn create_topic(&mut self, _topic: &TopicMetadata) -> Result<()> {
        Ok(())
    }

    async fn write(&mut self, _message: &SerializedMessage) -> Result<()> {
        if self.mode != Some(IoMode::ReadWrite) {
            bail!("{} is not writable", self.spec.name);
        }
        Ok(())
    }

    fn into_read_only(self: Box<Self>) -> Box<dyn ReadOnlyStorage> {
        self
    }
}

fn as_read_only(backend: MockBackend) -> Box<dyn ReadOnlyStorage> {
    Box::new(backend)
}

fn as_read_write(backend: MockBackend) -> Box<dyn ReadWriteStorage> {
    Box::new(backend)
}

fn build<B: ?Sized + 'static>(
    capability: Capability,
    specs: &[MockSpec],
    log: &CallLog,
    wrap: fn(MockBackend) -> Box<B>,
) -> PluginRegistry<B> {
    let mut registry = PluginRegistry::new(capability);

    for spec in specs {
        let name = spec.name.clone();
        let extension = spec.extension.clone();
        let spec = spec.clone();
        let log = log.clone();

        registry
            .register(name, extension, move || {
                log.push(Call::Instantiated(spec.name.clone()));
                if !spec.instantiates {
                    bail!("{} constructor failed", spec.name);
                }
                Ok(wrap(MockBackend {
                    spec: spec.clone(),
                    log: log.clone(),
                    mode: None,
                }))
            })
            .unwrap();
    }

    registry
}

pub fn read_only_registry(specs: &[MockSpec], log: &CallLog) -> PluginRegistry<dyn ReadOnlyStorage> {
    build(Capability::ReadOnly, specs, log, as_read_only)
}

pub fn read_write_registry(
    specs: &[MockSpec],
    log: &CallLog,
) -> PluginRegistry<dyn ReadWriteStorage> {
    build(Capability::ReadWrite, specs, log, as_read_write)
}
