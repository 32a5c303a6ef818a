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

// Filesystem reader for recordings laid out as one directory per entry
//
//   <base>/<entry>/<timestamp_us>.<format>
//   <base>/<entry>/<timestamp_us>.<metadata_suffix>   (optional JSON labels)

use super::backend::{BaseStorage, IoMode, ReadOnlyStorage};
use super::request::StorageRequest;
use crate::config::FilesystemConfig;
use crate::message::{SerializedMessage, TopicMetadata};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

pub const FILESYSTEM_STORAGE_ID: &str = "filesystem";

/// Label naming the original topic of a record
const TOPIC_LABEL: &str = "topic";
/// Label carrying the message type, if the recorder knew it
const MESSAGE_TYPE_LABEL: &str = "message_type";

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexedRecord {
    timestamp_us: u64,
    topic: String,
    path: PathBuf,
}

/// Read-only backend over a directory tree of per-entry record files
pub struct FilesystemReader {
    config: FilesystemConfig,
    base_path: Option<PathBuf>,
    topics: Vec<TopicMetadata>,
    index: VecDeque<IndexedRecord>,
}

impl FilesystemReader {
    pub fn new(config: FilesystemConfig) -> Self {
        Self {
            config,
            base_path: None,
            topics: Vec::new(),
            index: VecDeque::new(),
        }
    }

    fn metadata_extension(&self) -> String {
        format!(".{}", self.config.metadata_suffix)
    }

    /// Read labels for a record, empty if no sidecar exists
    async fn read_labels(&self, entry_dir: &Path, timestamp_us: u64) -> HashMap<String, String> {
        let metadata_path =
            entry_dir.join(format!("{}.{}", timestamp_us, self.config.metadata_suffix));

        let content = match fs::read_to_string(&metadata_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(
                    "Ignoring unreadable metadata {}: {}",
                    metadata_path.display(),
                    e
                );
                return HashMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(
                "Ignoring unreadable metadata {}: {}",
                metadata_path.display(),
                e
            );
            HashMap::new()
        })
    }

    /// Index every record below `base_path`
    async fn scan(&mut self, base_path: &Path) -> Result<()> {
        let mut records = Vec::new();
        let mut topics: BTreeMap<String, TopicMetadata> = BTreeMap::new();
        let metadata_extension = self.metadata_extension();

        let mut entries = fs::read_dir(base_path)
            .await
            .with_context(|| format!("Failed to list {}", base_path.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let entry_dir = entry.path();
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            let mut files = fs::read_dir(&entry_dir)
                .await
                .with_context(|| format!("Failed to list {}", entry_dir.display()))?;

            while let Some(file) = files.next_entry().await? {
                let file_name = file.file_name().to_string_lossy().into_owned();
                if file_name.ends_with(&metadata_extension) || !file.file_type().await?.is_file() {
                    continue;
                }

                let Some((stem, format)) = file_name.split_once('.') else {
                    debug!("Skipping {}: no format extension", file_name);
                    continue;
                };
                let Ok(timestamp_us) = stem.parse::<u64>() else {
                    debug!("Skipping {}: name is not a timestamp", file_name);
                    continue;
                };

                let labels = self.read_labels(&entry_dir, timestamp_us).await;
                let topic = labels
                    .get(TOPIC_LABEL)
                    .cloned()
                    .unwrap_or_else(|| entry_name.clone());

                topics.entry(topic.clone()).or_insert_with(|| {
                    TopicMetadata::new(
                        topic.clone(),
                        labels.get(MESSAGE_TYPE_LABEL).cloned().unwrap_or_default(),
                    )
                    .with_format(format)
                });

                records.push(IndexedRecord {
                    timestamp_us,
                    topic,
                    path: file.path(),
                });
            }
        }

        records.sort_by(|a, b| {
            a.timestamp_us
                .cmp(&b.timestamp_us)
                .then_with(|| a.topic.cmp(&b.topic))
        });

        info!(
            "Indexed {} records across {} topics in {}",
            records.len(),
            topics.len(),
            base_path.display()
        );

        self.topics = topics.into_values().collect();
        self.index = records.into();
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.base_path.is_none() {
            bail!("filesystem storage is not open");
        }
        Ok(())
    }
}

#[async_trait]
impl BaseStorage for FilesystemReader {
    fn storage_identifier(&self) -> &str {
        FILESYSTEM_STORAGE_ID
    }

    fn file_extension(&self) -> &str {
        ""
    }

    async fn open(&mut self, request: &StorageRequest, io_mode: IoMode) -> Result<()> {
        if io_mode == IoMode::ReadWrite {
            bail!("filesystem storage is read-only");
        }
        if self.base_path.is_some() {
            bail!("filesystem storage is already open");
        }

        let base_path = PathBuf::from(request.location());
        let metadata = fs::metadata(&base_path)
            .await
            .with_context(|| format!("Cannot access {}", base_path.display()))?;
        if !metadata.is_dir() {
            bail!("{} is not a directory", base_path.display());
        }

        self.scan(&base_path).await?;
        self.base_path = Some(base_path);
        Ok(())
    }
}

#[async_trait]
impl ReadOnlyStorage for FilesystemReader {
    fn relative_file_path(&self) -> Option<String> {
        self.base_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn topics(&self) -> Vec<TopicMetadata> {
        self.topics.clone()
    }

    async fn has_next(&mut self) -> Result<bool> {
        self.ensure_open()?;
        Ok(!self.index.is_empty())
    }

    async fn read_next(&mut self) -> Result<Option<SerializedMessage>> {
        self.ensure_open()?;

        let Some(record) = self.index.pop_front() else {
            return Ok(None);
        };

        let payload = fs::read(&record.path)
            .await
            .with_context(|| format!("Failed to read {}", record.path.display()))?;
        let timestamp_ns = i64::try_from(record.timestamp_us)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);

        Ok(Some(SerializedMessage {
            topic: record.topic,
            timestamp_ns,
            payload,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_record(base: &Path, entry: &str, timestamp_us: u64, data: &[u8], topic: Option<&str>) {
        let entry_dir = base.join(entry);
        std::fs::create_dir_all(&entry_dir).unwrap();
        std::fs::write(entry_dir.join(format!("{}.mcap", timestamp_us)), data).unwrap();

        if let Some(topic) = topic {
            let mut labels = HashMap::new();
            labels.insert("topic".to_string(), topic.to_string());
            labels.insert("recording_id".to_string(), "rec-001".to_string());
            std::fs::write(
                entry_dir.join(format!("{}.meta.json", timestamp_us)),
                serde_json::to_string_pretty(&labels).unwrap(),
            )
            .unwrap();
        }
    }

    fn open_request(dir: &TempDir) -> StorageRequest {
        StorageRequest::new(dir.path().to_string_lossy().to_string())
    }

    #[tokio::test]
    async fn test_reads_in_timestamp_order() {
        let temp_dir = TempDir::new().unwrap();
        write_record(temp_dir.path(), "camera_front", 300, b"c", Some("/camera/front"));
        write_record(temp_dir.path(), "lidar_points", 100, b"a", None);
        write_record(temp_dir.path(), "camera_front", 200, b"b", Some("/camera/front"));

        let mut reader = FilesystemReader::new(FilesystemConfig::default());
        reader
            .open(&open_request(&temp_dir), IoMode::ReadOnly)
            .await
            .unwrap();

        let topics: Vec<String> = reader.topics().into_iter().map(|t| t.name).collect();
        assert_eq!(topics, vec!["/camera/front", "lidar_points"]);
        assert_eq!(reader.topics()[0].serialization_format, "mcap");

        let mut order = Vec::new();
        while let Some(message) = reader.read_next().await.unwrap() {
            order.push((message.topic, message.timestamp_ns, message.payload));
        }
        assert_eq!(
            order,
            vec![
                ("lidar_points".to_string(), 100_000, b"a".to_vec()),
                ("/camera/front".to_string(), 200_000, b"b".to_vec()),
                ("/camera/front".to_string(), 300_000, b"c".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreadable_labels_fall_back_to_entry_name() {
        let temp_dir = TempDir::new().unwrap();
        write_record(temp_dir.path(), "imu", 100, b"a", None);
        write_record(temp_dir.path(), "imu", 200, b"b", None);
        // A sidecar path that exists but cannot be read as a file
        std::fs::create_dir(temp_dir.path().join("imu").join("200.meta.json")).unwrap();

        let reader = FilesystemReader::new(FilesystemConfig::default());
        let entry_dir = temp_dir.path().join("imu");
        assert!(reader.read_labels(&entry_dir, 100).await.is_empty());
        assert!(reader.read_labels(&entry_dir, 200).await.is_empty());

        let mut reader = FilesystemReader::new(FilesystemConfig::default());
        reader
            .open(&open_request(&temp_dir), IoMode::ReadOnly)
            .await
            .unwrap();
        let topics: Vec<String> = reader.topics().into_iter().map(|t| t.name).collect();
        assert_eq!(topics, vec!["imu"]);
        assert_eq!(reader.read_next().await.unwrap().unwrap().payload, b"a".to_vec());
        assert_eq!(reader.read_next().await.unwrap().unwrap().payload, b"b".to_vec());
    }

    #[tokio::test]
    async fn test_skips_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        write_record(temp_dir.path(), "imu", 5, b"x", None);
        std::fs::write(temp_dir.path().join("imu").join("notes.txt"), b"n").unwrap();
        std::fs::write(temp_dir.path().join("README"), b"top-level file").unwrap();

        let mut reader = FilesystemReader::new(FilesystemConfig::default());
        reader
            .open(&open_request(&temp_dir), IoMode::ReadOnly)
            .await
            .unwrap();

        assert!(reader.has_next().await.unwrap());
        reader.read_next().await.unwrap();
        assert!(!reader.has_next().await.unwrap());
    }

    #[tokio::test]
    async fn test_open_rejects_file_and_write_mode() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("session.rec");
        std::fs::write(&file_path, b"data").unwrap();

        let mut reader = FilesystemReader::new(FilesystemConfig::default());
        let request = StorageRequest::new(file_path.to_string_lossy().to_string());
        assert!(reader.open(&request, IoMode::ReadOnly).await.is_err());

        let mut reader = FilesystemReader::new(FilesystemConfig::default());
        assert!(reader
            .open(&open_request(&temp_dir), IoMode::ReadWrite)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_read_before_open() {
        let mut reader = FilesystemReader::new(FilesystemConfig::default());
        assert!(reader.has_next().await.is_err());
    }
}
