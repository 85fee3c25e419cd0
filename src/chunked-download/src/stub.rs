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

//! The collaborators of [ChunkedDownload][crate::ChunkedDownload].
//!
//! The download controller only needs two capabilities: fetch a range of bytes
//! from an object, and persist bytes into a numbered chunk slot. The crate
//! provides [HttpRangeFetcher][crate::HttpRangeFetcher] and
//! [FileChunkSink][crate::FileChunkSink]. Applications may implement these
//! traits to use other stores or destinations, and to mock them in tests.

use crate::Result;
use crate::request::RequestedRange;

/// The payload and metadata returned by a range fetch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedRange {
    /// The bytes returned by the store.
    pub payload: bytes::Bytes,
    /// The content range as reported by the store, for example
    /// `bytes 0-1048575/1048576`.
    pub content_range: String,
}

impl FetchedRange {
    pub fn new<P, C>(payload: P, content_range: C) -> Self
    where
        P: Into<bytes::Bytes>,
        C: Into<String>,
    {
        Self {
            payload: payload.into(),
            content_range: content_range.into(),
        }
    }
}

/// Fetches byte ranges of an object.
pub trait RangeFetcher: std::fmt::Debug + Send + Sync {
    /// Fetches the inclusive `range` of bytes in `object_id`.
    ///
    /// The store may return a shorter range than requested, the returned
    /// content range must describe the bytes actually returned.
    fn fetch_range(
        &self,
        object_id: &str,
        range: RequestedRange,
    ) -> impl std::future::Future<Output = Result<FetchedRange>> + Send;
}

/// Opens the output destination for each chunk.
pub trait ChunkSink: std::fmt::Debug + Send + Sync {
    /// The handle used to write a single chunk.
    type Writer: ChunkWriter;

    /// Opens the destination for chunk `ordinal`.
    ///
    /// Each ordinal is opened exactly once per transfer, and the previous
    /// writer is finalized before the next slot is opened.
    fn open_slot(
        &self,
        ordinal: u64,
    ) -> impl std::future::Future<Output = Result<Self::Writer>> + Send;
}

/// Writes the data for a single chunk.
pub trait ChunkWriter: Send {
    /// Appends `payload` to the chunk.
    fn write(&mut self, payload: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Flushes and closes the chunk.
    fn finalize(self) -> impl std::future::Future<Output = Result<()>> + Send;
}
