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

//! Chunked downloads from object stores.
//!
//! This crate downloads a single object as a sequence of HTTP range requests,
//! writing each range to its own chunk file. Most applications will use:
//!
//! * [ChunkedDownload] to run the transfer.
//! * [HttpRangeFetcher] to fetch ranges from an S3-compatible store.
//! * [FileChunkSink] to write the chunks to a directory.
//!
//! The transfer fetches one range at a time. The first range is
//! `[0, chunk_size]`, and each following range starts right after the last
//! byte reported in the store's `Content-Range` header. The transfer is
//! complete when the store reports the last byte of the object.
//!
//! Use the traits in [stub] to fetch ranges from other sources, or to write
//! the chunks somewhere other than the local filesystem.

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, TransferError>;

pub mod backoff_policy;
pub mod error;
pub mod retry_policy;
pub mod stub;

mod content_range;
mod controller;
mod file_sink;
mod http_fetcher;
mod request;
mod state;

pub use content_range::ContentRange;
pub use controller::{ChunkedDownload, TransferSummary};
pub use error::TransferError;
pub use file_sink::{ChunkNaming, FileChunkSink, FileChunkWriter};
pub use http_fetcher::{Credentials, HttpRangeFetcher};
pub use request::{DEFAULT_CHUNK_SIZE, RequestedRange, TransferRequest};
pub use state::{Step, TransferState};
