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

// Creation of single-file recordings

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::warn;

/// Create a new file at `path` and write `header` to it
///
/// Fails if the file already exists. A file whose header could not be
/// written is removed again, so the location stays free for the next
/// backend.
pub(crate) async fn create_with_header(path: &Path, header: &[u8]) -> Result<fs::File> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .with_context(|| format!("Failed to create record file: {}", path.display()))?;

    write_or_discard(path, &mut file, header).await?;
    Ok(file)
}

async fn write_or_discard<W>(path: &Path, writer: &mut W, header: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(header).await?;
        writer.flush().await
    }
    .await;

    if let Err(e) = written {
        if let Err(remove_err) = fs::remove_file(path).await {
            warn!(
                "Failed to remove partial file {}: {}",
                path.display(),
                remove_err
            );
        }
        return Err(anyhow::Error::new(e)
            .context(format!("Failed to write header to {}", path.display())));
    }

    Ok(())
}
