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

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use recorder_storage::config::{apply_env_overrides, load_config_with_env, RecorderStorageConfig};
use recorder_storage::{StorageFactory, StorageRequest};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Open an existing recording and summarize it
    Read,
    /// Create an empty recording
    Write,
}

/// Recorder Storage - resolve and open recording storage backends
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage location (overrides config file)
    #[arg(short, long)]
    uri: Option<String>,

    /// Explicit storage backend id (overrides config file)
    #[arg(short, long)]
    storage_id: Option<String>,

    /// Open for reading or create for writing
    #[arg(short, long, value_enum, default_value_t = Mode::Read)]
    mode: Mode,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_with_env(path)?,
        None => {
            let mut config = RecorderStorageConfig::default();
            apply_env_overrides(&mut config);
            config
        }
    };

    // Apply CLI overrides
    if let Some(uri) = args.uri {
        config.storage.uri = uri;
    }
    if let Some(storage_id) = args.storage_id {
        config.storage.storage_id = Some(storage_id);
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format.to_lowercase().as_str() {
        "json" => subscriber.json().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.init(),
    }

    info!("Starting Recorder Storage");
    if let Some(path) = &args.config {
        info!("Loaded configuration from: {:?}", path);
    }

    let factory = StorageFactory::from_config(&config.plugins)?;
    let request = StorageRequest::from(&config.storage);

    match args.mode {
        Mode::Read => {
            let Some(mut storage) = factory.open_read_only(&request).await else {
                bail!("No storage backend could open '{}'", request.location());
            };

            let mut count = 0usize;
            while storage.read_next().await?.is_some() {
                count += 1;
            }

            println!("backend: {}", storage.storage_identifier());
            for topic in storage.topics() {
                println!(
                    "topic: {} [{}] ({})",
                    topic.name, topic.message_type, topic.serialization_format
                );
            }
            println!("messages: {}", count);
        }
        Mode::Write => {
            let Some(storage) = factory.open_read_write(&request).await else {
                bail!("No storage backend could create '{}'", request.location());
            };

            println!("backend: {}", storage.storage_identifier());
            println!("created: {}", request.location());
        }
    }

    Ok(())
}
