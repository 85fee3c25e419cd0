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

use crate::content_range::ContentRange;
use crate::error::{ConfigError, TransferError};

/// The default chunk size, 20 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 20 * 1024 * 1024;

/// The object to download and the size of each range request.
///
/// # Example
/// ```
/// # use chunked_download::TransferRequest;
/// let request = TransferRequest::new("media/episode-01.mp3", 1024 * 1024)?;
/// assert_eq!(request.object_id(), "media/episode-01.mp3");
/// assert_eq!(request.chunk_size(), 1024 * 1024);
/// # Ok::<(), chunked_download::TransferError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    object_id: String,
    chunk_size: u64,
}

impl TransferRequest {
    /// Creates a new request, validating its parameters.
    ///
    /// Fails with a [configuration][TransferError::is_configuration] error if
    /// the object id is empty or the chunk size is zero.
    pub fn new<T: Into<String>>(object_id: T, chunk_size: u64) -> Result<Self, TransferError> {
        let object_id = object_id.into();
        if object_id.is_empty() {
            return Err(TransferError::configuration(ConfigError::EmptyObjectId));
        }
        if chunk_size == 0 {
            return Err(TransferError::configuration(ConfigError::ZeroChunkSize));
        }
        Ok(Self {
            object_id,
            chunk_size,
        })
    }

    /// Creates a new request using [DEFAULT_CHUNK_SIZE].
    pub fn with_default_chunk_size<T: Into<String>>(object_id: T) -> Result<Self, TransferError> {
        Self::new(object_id, DEFAULT_CHUNK_SIZE)
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }
}

/// An inclusive range of bytes requested from the store.
///
/// The first range of a transfer is `[0, chunk_size]`, that is, it requests
/// `chunk_size + 1` bytes. Every following range starts right after the last
/// byte the store actually returned, and requests exactly `chunk_size` bytes.
/// Existing chunk layouts depend on this asymmetry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestedRange {
    pub start: u64,
    pub end: u64,
}

impl RequestedRange {
    /// The first range of a transfer.
    ///
    /// # Example
    /// ```
    /// # use chunked_download::RequestedRange;
    /// let range = RequestedRange::first(1024);
    /// assert_eq!((range.start, range.end), (0, 1024));
    /// ```
    pub fn first(chunk_size: u64) -> Self {
        Self {
            start: 0,
            end: chunk_size,
        }
    }

    /// The range following the data described by `previous`.
    ///
    /// # Example
    /// ```
    /// # use chunked_download::{ContentRange, RequestedRange};
    /// let previous = ContentRange::new(0, 1024, 4096);
    /// let range = RequestedRange::following(&previous, 1024);
    /// assert_eq!((range.start, range.end), (1025, 2048));
    /// ```
    pub fn following(previous: &ContentRange, chunk_size: u64) -> Self {
        Self {
            start: previous.end.saturating_add(1),
            end: previous.end.saturating_add(chunk_size),
        }
    }

    /// The value for the HTTP `Range` header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl std::fmt::Display for RequestedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn request_success() -> anyhow::Result<()> {
        let request = TransferRequest::new("my-object", 42)?;
        assert_eq!(request.object_id(), "my-object");
        assert_eq!(request.chunk_size(), 42);

        let request = TransferRequest::with_default_chunk_size("my-object")?;
        assert_eq!(request.chunk_size(), 20 * 1024 * 1024);
        Ok(())
    }

    #[test_case("", 1, ConfigError::EmptyObjectId)]
    #[test_case("my-object", 0, ConfigError::ZeroChunkSize)]
    fn request_invalid(object_id: &str, chunk_size: u64, want: ConfigError) {
        use std::error::Error as _;
        let err = TransferRequest::new(object_id, chunk_size)
            .expect_err("invalid parameters should fail");
        assert!(err.is_configuration(), "{err:?}");
        let source = err.source().and_then(|e| e.downcast_ref::<ConfigError>());
        assert_eq!(source, Some(&want), "{err:?}");
    }

    #[test_case(1, 0, 1)]
    #[test_case(1048575, 0, 1048575)]
    #[test_case(20971520, 0, 20971520)]
    fn first(chunk_size: u64, start: u64, end: u64) {
        assert_eq!(RequestedRange::first(chunk_size), RequestedRange { start, end });
    }

    #[test_case(ContentRange::new(0, 20971520, 50_000_000), 20971520, RequestedRange { start: 20971521, end: 41943040 })]
    #[test_case(ContentRange::new(20971521, 41943040, 50_000_000), 20971520, RequestedRange { start: 41943041, end: 62914560 })]
    #[test_case(ContentRange::new(0, 9, 100), 10, RequestedRange { start: 10, end: 19 })]
    #[test_case(ContentRange::new(0, u64::MAX - 1, u64::MAX), 10, RequestedRange { start: u64::MAX, end: u64::MAX }; "saturates")]
    fn following(previous: ContentRange, chunk_size: u64, want: RequestedRange) {
        assert_eq!(RequestedRange::following(&previous, chunk_size), want);
    }

    #[test]
    fn header_value() {
        let range = RequestedRange { start: 5, end: 104 };
        assert_eq!(range.header_value(), "bytes=5-104");
        assert_eq!(range.to_string(), "5-104");
    }
}
