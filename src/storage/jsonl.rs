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

// JSON Lines backend: one JSON document per line, human-inspectable

use super::backend::{BaseStorage, IoMode, ReadOnlyStorage, ReadWriteStorage};
use super::create::create_with_header;
use super::request::StorageRequest;
use crate::message::{SerializedMessage, TopicMetadata};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub const JSONL_STORAGE_ID: &str = "jsonl";
pub const JSONL_EXTENSION: &str = "jsonl";

const FORMAT_NAME: &str = "recorder-jsonl";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    format: String,
    version: u32,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum EntryRef<'a> {
    Topic(&'a TopicMetadata),
    Message(&'a SerializedMessage),
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Entry {
    Topic(TopicMetadata),
    Message(SerializedMessage),
}

/// Read-write backend writing newline-delimited JSON
#[derive(Default)]
pub struct JsonLinesStorage {
    path: Option<PathBuf>,
    mode: Option<IoMode>,
    writer: Option<fs::File>,
    topics: Vec<TopicMetadata>,
    messages: VecDeque<SerializedMessage>,
}

impl JsonLinesStorage {
    pub fn new() -> Self {
        Self::default()
    }

    async fn create(&mut self, path: &Path) -> Result<()> {
        let header = Header {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION,
        };
        let mut line = serde_json::to_string(&header).context("Failed to serialize header")?;
        line.push('\n');
        self.writer = Some(create_with_header(path, line.as_bytes()).await?);

        info!("Created JSONL record file {}", path.display());
        Ok(())
    }

    async fn load(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read JSONL file: {}", path.display()))?;

        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, first) = lines
            .next()
            .ok_or_else(|| anyhow!("empty file, missing JSONL header"))?;
        let header: Header =
            serde_json::from_str(first).context("not a JSONL record file (bad header)")?;
        if header.format != FORMAT_NAME || header.version != FORMAT_VERSION {
            bail!(
                "unsupported JSONL format '{}' version {}",
                header.format,
                header.version
            );
        }

        let mut topics = Vec::new();
        let mut messages = Vec::new();
        for (index, line) in lines {
            let entry: Entry = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse line {}", index + 1))?;
            match entry {
                Entry::Topic(topic) => topics.push(topic),
                Entry::Message(message) => messages.push(message),
            }
        }
        messages.sort_by_key(|m| m.timestamp_ns);

        debug!(
            "Loaded {} topics and {} messages from {}",
            topics.len(),
            messages.len(),
            path.display()
        );

        self.topics = topics;
        self.messages = messages.into();
        Ok(())
    }

    async fn append_line(&mut self, mut line: String) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow!("JSONL storage is not open for writing"))?;

        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("Failed to write line")?;
        writer.flush().await.context("Failed to flush line")?;
        Ok(())
    }

    fn ensure_readable(&self) -> Result<()> {
        match self.mode {
            Some(IoMode::ReadOnly) => Ok(()),
            Some(IoMode::ReadWrite) => bail!("JSONL storage opened read-write cannot be read"),
            None => bail!("JSONL storage is not open"),
        }
    }
}

#[async_trait]
impl BaseStorage for JsonLinesStorage {
    fn storage_identifier(&self) -> &str {
        JSONL_STORAGE_ID
    }

    fn file_extension(&self) -> &str {
        JSONL_EXTENSION
    }

    async fn open(&mut self, request: &StorageRequest, io_mode: IoMode) -> Result<()> {
        if self.mode.is_some() {
            bail!("JSONL storage is already open");
        }

        let path = PathBuf::from(request.location());
        match io_mode {
            IoMode::ReadWrite => self.create(&path).await?,
            IoMode::ReadOnly => self.load(&path).await?,
        }

        self.path = Some(path);
        self.mode = Some(io_mode);
        Ok(())
    }
}

#[async_trait]
impl ReadOnlyStorage for JsonLinesStorage {
    fn relative_file_path(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn topics(&self) -> Vec<TopicMetadata> {
        self.topics.clone()
    }

    async fn has_next(&mut self) -> Result<bool> {
        self.ensure_readable()?;
        Ok(!self.messages.is_empty())
    }

    async fn read_next(&mut self) -> Result<Option<SerializedMessage>> {
        self.ensure_readable()?;
        Ok(self.messages.pop_front())
    }
}

#[async_trait]
impl ReadWriteStorage for JsonLinesStorage {
    async fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        if self.topics.iter().any(|t| t.name == topic.name) {
            return Ok(());
        }

        let line =
            serde_json::to_string(&EntryRef::Topic(topic)).context("Failed to serialize topic")?;
        self.append_line(line).await?;
        self.topics.push(topic.clone());
        Ok(())
    }

    async fn write(&mut self, message: &SerializedMessage) -> Result<()> {
        if !self.topics.iter().any(|t| t.name == message.topic) {
            bail!("topic '{}' has not been created", message.topic);
        }

        let line = serde_json::to_string(&EntryRef::Message(message))
            .context("Failed to serialize message")?;
        self.append_line(line).await
    }

    fn into_read_only(self: Box<Self>) -> Box<dyn ReadOnlyStorage> {
        self
    }
}
