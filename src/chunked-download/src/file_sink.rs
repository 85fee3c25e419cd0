// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use crate::error::{ConfigError, TransferError};
use crate::stub::{ChunkSink, ChunkWriter};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const ORDINAL_PLACEHOLDER: &str = "{ordinal}";

/// The file name template for chunk files.
///
/// Every occurrence of `{ordinal}` is replaced by the chunk ordinal.
///
/// # Example
/// ```
/// # use chunked_download::ChunkNaming;
/// let naming = ChunkNaming::new("tmp_{ordinal}.mp3")?;
/// assert_eq!(naming.file_name(3), "tmp_3.mp3");
/// # Ok::<(), chunked_download::TransferError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkNaming {
    template: String,
}

impl ChunkNaming {
    /// Creates a new template.
    ///
    /// Fails with a [configuration][TransferError::is_configuration] error if
    /// the template does not contain `{ordinal}`, or if it contains a path
    /// separator.
    pub fn new<T: Into<String>>(template: T) -> Result<Self> {
        let template = template.into();
        if !template.contains(ORDINAL_PLACEHOLDER) {
            return Err(TransferError::configuration(ConfigError::MissingOrdinal(
                template,
            )));
        }
        if template.contains(['/', '\\']) {
            return Err(TransferError::configuration(ConfigError::PathSeparator(
                template,
            )));
        }
        Ok(Self { template })
    }

    /// The file name for chunk `ordinal`.
    pub fn file_name(&self, ordinal: u64) -> String {
        self.template
            .replace(ORDINAL_PLACEHOLDER, &ordinal.to_string())
    }
}

impl Default for ChunkNaming {
    fn default() -> Self {
        Self {
            template: format!("chunk_{ORDINAL_PLACEHOLDER}"),
        }
    }
}

/// Writes each chunk to its own file in a directory.
///
/// The directory is created, including any missing parents, when the first
/// slot is opened. Existing files with the same name are truncated.
#[derive(Clone, Debug)]
pub struct FileChunkSink {
    directory: PathBuf,
    naming: ChunkNaming,
}

impl FileChunkSink {
    pub fn new<P: Into<PathBuf>>(directory: P, naming: ChunkNaming) -> Self {
        Self {
            directory: directory.into(),
            naming,
        }
    }

    /// The path of the file for chunk `ordinal`.
    ///
    /// # Example
    /// ```
    /// # use chunked_download::{ChunkNaming, FileChunkSink};
    /// let sink = FileChunkSink::new("tmp", ChunkNaming::default());
    /// assert_eq!(sink.path(2), std::path::Path::new("tmp/chunk_2"));
    /// ```
    pub fn path(&self, ordinal: u64) -> PathBuf {
        self.directory.join(self.naming.file_name(ordinal))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ChunkSink for FileChunkSink {
    type Writer = FileChunkWriter;

    async fn open_slot(&self, ordinal: u64) -> Result<FileChunkWriter> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(TransferError::io)?;
        let path = self.path(ordinal);
        let file = tokio::fs::File::create(&path)
            .await
            .map_err(TransferError::io)?;
        Ok(FileChunkWriter { file, path })
    }
}

/// Writes a single chunk file.
#[derive(Debug)]
pub struct FileChunkWriter {
    file: tokio::fs::File,
    path: PathBuf,
}

impl FileChunkWriter {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkWriter for FileChunkWriter {
    async fn write(&mut self, payload: &[u8]) -> Result<()> {
        self.file
            .write_all(payload)
            .await
            .map_err(TransferError::io)
    }

    async fn finalize(mut self) -> Result<()> {
        self.file.flush().await.map_err(TransferError::io)?;
        self.file.sync_all().await.map_err(TransferError::io)?;
        tracing::debug!(path = %self.path.display(), "chunk file closed");
        Ok(())
    }
}
