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

/// End-to-end tests of the factory with the built-in backends
use recorder_storage::config::PluginConfig;
use recorder_storage::storage::{ReadOnlyStorage, StorageError, StorageFactory, StorageRequest};
use recorder_storage::{SerializedMessage, TopicMetadata};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

fn location(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().to_string()
}

async fn record(factory: &StorageFactory, request: &StorageRequest, count: i64) -> String {
    let mut storage = factory
        .open_read_write(request)
        .await
        .expect("storage should be created");

    storage
        .create_topic(&TopicMetadata::new("/camera/front", "sensor_msgs/Image"))
        .await
        .unwrap();
    for i in 0..count {
        storage
            .write(&SerializedMessage::new(
                "/camera/front",
                i * 1_000,
                format!("frame_{}", i).into_bytes(),
            ))
            .await
            .unwrap();
    }

    storage.storage_identifier().to_string()
}

async fn read_all(storage: &mut Box<dyn ReadOnlyStorage>) -> Vec<SerializedMessage> {
    let mut messages = Vec::new();
    while storage.has_next().await.unwrap() {
        messages.push(storage.read_next().await.unwrap().unwrap());
    }
    messages
}

#[tokio::test]
async fn test_framed_auto_detect_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let factory = StorageFactory::with_builtin_backends().unwrap();
    let request = StorageRequest::new(location(&temp_dir, "session.rec"));

    assert_eq!(record(&factory, &request, 3).await, "framed");

    let mut storage = factory.open_read_only(&request).await.unwrap();
    assert_eq!(storage.storage_identifier(), "framed");
    assert_eq!(storage.relative_file_path().as_deref(), Some("session.rec"));

    let messages = read_all(&mut storage).await;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].payload, b"frame_2".to_vec());
}

#[tokio::test]
async fn test_jsonl_read_skips_framed_candidate() {
    let temp_dir = TempDir::new().unwrap();
    let factory = StorageFactory::with_builtin_backends().unwrap();
    let request = StorageRequest::new(location(&temp_dir, "session.jsonl"));

    assert_eq!(record(&factory, &request, 2).await, "jsonl");

    // framed is tried first and rejects the header; jsonl opens it
    let resolution = factory.resolve_read_only(&request).await;
    assert_eq!(resolution.diagnostics.len(), 1);
    assert_eq!(resolution.diagnostics[0].backend.as_deref(), Some("framed"));

    let mut storage = resolution.instance.unwrap();
    assert_eq!(storage.storage_identifier(), "jsonl");
    assert_eq!(storage.topics()[0].name, "/camera/front");
    assert_eq!(read_all(&mut storage).await.len(), 2);
}

#[tokio::test]
async fn test_unknown_extension_creates_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let factory = StorageFactory::with_builtin_backends().unwrap();
    let path = location(&temp_dir, "session.db3");

    let result = factory.open_read_write(&StorageRequest::new(path.clone())).await;

    assert!(result.is_none());
    assert!(!Path::new(&path).exists());
}

#[tokio::test]
async fn test_explicit_id_overrides_extension() {
    let temp_dir = TempDir::new().unwrap();
    let factory = StorageFactory::with_builtin_backends().unwrap();
    let path = location(&temp_dir, "session.rec");

    let request = StorageRequest::with_backend(path.clone(), "jsonl");
    assert_eq!(record(&factory, &request, 1).await, "jsonl");

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("{\"format\":\"recorder-jsonl\""));

    // Auto-detect still finds it on read, extension notwithstanding
    let storage = factory
        .open_read_only(&StorageRequest::new(path))
        .await
        .unwrap();
    assert_eq!(storage.storage_identifier(), "jsonl");
}

#[tokio::test]
async fn test_existing_file_is_not_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let factory = StorageFactory::with_builtin_backends().unwrap();
    let request = StorageRequest::new(location(&temp_dir, "session.rec"));

    record(&factory, &request, 1).await;
    assert!(factory.open_read_write(&request).await.is_none());

    let mut storage = factory.open_read_only(&request).await.unwrap();
    assert_eq!(read_all(&mut storage).await.len(), 1);
}

#[tokio::test]
async fn test_directory_opens_with_filesystem_reader() {
    let temp_dir = TempDir::new().unwrap();
    let entry_dir = temp_dir.path().join("lidar_points");
    std::fs::create_dir_all(&entry_dir).unwrap();
    std::fs::write(entry_dir.join("1700000000000000.mcap"), b"points").unwrap();

    let mut labels = HashMap::new();
    labels.insert("topic", "/lidar/points");
    std::fs::write(
        entry_dir.join("1700000000000000.meta.json"),
        serde_json::to_string(&labels).unwrap(),
    )
    .unwrap();

    let factory = StorageFactory::with_builtin_backends().unwrap();
    let request = StorageRequest::new(temp_dir.path().to_string_lossy().to_string());
    let mut storage = factory.open_read_only(&request).await.unwrap();

    assert_eq!(storage.storage_identifier(), "filesystem");
    let messages = read_all(&mut storage).await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].topic, "/lidar/points");
    assert_eq!(messages[0].timestamp_ns, 1_700_000_000_000_000_000);
}

#[tokio::test]
async fn test_read_only_fallback_with_builtins() {
    let temp_dir = TempDir::new().unwrap();
    let config = PluginConfig {
        read_only: vec!["filesystem".to_string()],
        ..PluginConfig::default()
    };
    let factory = StorageFactory::from_config(&config).unwrap();
    let request = StorageRequest::new(location(&temp_dir, "session.rec"));

    record(&factory, &request, 4).await;

    // filesystem rejects a plain file, framed opens it read-only
    let resolution = factory.resolve_read_only(&request).await;
    let mut storage = resolution.instance.expect("fallback should open the file");
    assert_eq!(storage.storage_identifier(), "framed");
    assert_eq!(read_all(&mut storage).await.len(), 4);
    assert_eq!(
        resolution.diagnostics[0].backend.as_deref(),
        Some("filesystem")
    );
}

#[tokio::test]
async fn test_missing_location_opens_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let factory = StorageFactory::with_builtin_backends().unwrap();

    let request = StorageRequest::new(location(&temp_dir, "absent.rec"));
    assert!(factory.open_read_only(&request).await.is_none());
}

#[test]
fn test_unknown_plugin_makes_factory_unavailable() {
    let config = PluginConfig {
        read_write: vec!["framed".to_string(), "sqlite3".to_string()],
        ..PluginConfig::default()
    };

    match StorageFactory::from_config(&config) {
        Err(StorageError::RegistryUnavailable(message)) => assert!(message.contains("sqlite3")),
        _ => panic!("expected RegistryUnavailable"),
    }
}
