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

//! Framed record file backend
//!
//! # Format Structure
//!
//! ```text
//! RECORDER_FRAMED|version=1\n
//! [kind: u8][len: u32 LE][protobuf bytes] ...
//! ```
//!
//! Kind 1 frames carry a `TopicInfo`, kind 2 frames a `StoredMessage`.
//! Frames are appended and flushed one at a time. The reader rejects a
//! file whose last frame is incomplete.

use super::backend::{BaseStorage, IoMode, ReadOnlyStorage, ReadWriteStorage};
use super::create::create_with_header;
use super::request::StorageRequest;
use crate::message::{SerializedMessage, TopicMetadata};
use crate::proto::{StoredMessage, TopicInfo};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use prost::Message;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub const FRAMED_STORAGE_ID: &str = "framed";
pub const FRAMED_EXTENSION: &str = "rec";

const HEADER: &[u8] = b"RECORDER_FRAMED|version=1\n";
const FRAME_TOPIC: u8 = 1;
const FRAME_MESSAGE: u8 = 2;
const FRAME_PREFIX_LEN: usize = 5;

/// Read-write backend storing protobuf frames in a single `.rec` file
#[derive(Default)]
pub struct FramedFileStorage {
    path: Option<PathBuf>,
    mode: Option<IoMode>,
    writer: Option<fs::File>,
    topics: Vec<TopicMetadata>,
    messages: VecDeque<SerializedMessage>,
}

impl FramedFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    async fn create(&mut self, path: &Path) -> Result<()> {
        self.writer = Some(create_with_header(path, HEADER).await?);
        info!("Created framed record file {}", path.display());
        Ok(())
    }

    async fn load(&mut self, path: &Path) -> Result<()> {
        let data = fs::read(path)
            .await
            .with_context(|| format!("Failed to read record file: {}", path.display()))?;

        let (topics, mut messages) = decode_frames(&data)?;
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

    async fn append(&mut self, frame: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| anyhow!("framed storage is not open for writing"))?;

        writer
            .write_all(frame)
            .await
            .context("Failed to write frame")?;
        writer.flush().await.context("Failed to flush frame")?;
        Ok(())
    }

    fn ensure_readable(&self) -> Result<()> {
        match self.mode {
            Some(IoMode::ReadOnly) => Ok(()),
            Some(IoMode::ReadWrite) => bail!("framed storage opened read-write cannot be read"),
            None => bail!("framed storage is not open"),
        }
    }
}

#[async_trait]
impl BaseStorage for FramedFileStorage {
    fn storage_identifier(&self) -> &str {
        FRAMED_STORAGE_ID
    }

    fn file_extension(&self) -> &str {
        FRAMED_EXTENSION
    }

    async fn open(&mut self, request: &StorageRequest, io_mode: IoMode) -> Result<()> {
        if self.mode.is_some() {
            bail!("framed storage is already open");
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
impl ReadOnlyStorage for FramedFileStorage {
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
impl ReadWriteStorage for FramedFileStorage {
    async fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        if self.topics.iter().any(|t| t.name == topic.name) {
            return Ok(());
        }

        let frame = encode_frame(FRAME_TOPIC, &TopicInfo::from(topic))?;
        self.append(&frame).await?;
        self.topics.push(topic.clone());
        Ok(())
    }

    async fn write(&mut self, message: &SerializedMessage) -> Result<()> {
        if !self.topics.iter().any(|t| t.name == message.topic) {
            bail!("topic '{}' has not been created", message.topic);
        }

        let frame = encode_frame(FRAME_MESSAGE, &StoredMessage::from(message))?;
        self.append(&frame).await
    }

    fn into_read_only(self: Box<Self>) -> Box<dyn ReadOnlyStorage> {
        self
    }
}

fn encode_frame(kind: u8, message: &impl Message) -> Result<Vec<u8>> {
    let body = message.encode_to_vec();
    let len = frame_len(body.len())?;
    let mut frame = Vec::with_capacity(FRAME_PREFIX_LEN + body.len());
    frame.push(kind);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Frame bodies are limited to what the u32 length prefix can express
fn frame_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| anyhow!("frame of {} bytes exceeds the 4 GiB frame limit", len))
}

fn decode_frames(data: &[u8]) -> Result<(Vec<TopicMetadata>, Vec<SerializedMessage>)> {
    let mut rest = data
        .strip_prefix(HEADER)
        .ok_or_else(|| anyhow!("not a framed record file (header mismatch)"))?;

    let mut topics = Vec::new();
    let mut messages = Vec::new();

    while !rest.is_empty() {
        let offset = data.len() - rest.len();
        if rest.len() < FRAME_PREFIX_LEN {
            bail!("truncated frame prefix at offset {}", offset);
        }

        let kind = rest[0];
        let len = u32::from_le_bytes(rest[1..FRAME_PREFIX_LEN].try_into()?) as usize;
        let body = &rest[FRAME_PREFIX_LEN..];
        if body.len() < len {
            bail!(
                "truncated frame at offset {}: expected {} bytes, found {}",
                offset,
                len,
                body.len()
            );
        }

        let (frame, tail) = body.split_at(len);
        match kind {
            FRAME_TOPIC => topics.push(
                TopicInfo::decode(frame)
                    .context("Failed to decode topic frame")?
                    .into(),
            ),
            FRAME_MESSAGE => messages.push(
                StoredMessage::decode(frame)
                    .context("Failed to decode message frame")?
                    .into(),
            ),
            other => bail!("unknown frame kind {} at offset {}", other, offset),
        }

        rest = tail;
    }

    Ok((topics, messages))
}
