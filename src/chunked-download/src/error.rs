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

//! Errors for chunked downloads.
//!
//! All operations return a [TransferError]. The error kind can be queried with
//! the `is_*()` predicates. The more specific types defined in this module are
//! often returned as the [source][std::error::Error::source] of a
//! [TransferError].

use std::error::Error as StdError;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The error returned by all the operations in this crate.
///
/// Every error aborts the transfer. Chunks written before the error remain on
/// disk, the library never removes them.
///
/// # Example
/// ```
/// use chunked_download::TransferError;
/// match example_function() {
///     Err(e) if e.is_malformed_range() => println!("the store sent a bad range {e}"),
///     Err(e) if e.is_io() => println!("network or disk problem {e}"),
///     Err(e) => println!("some other error {e}"),
///     Ok(_) => println!("success"),
/// }
///
/// fn example_function() -> Result<u64, TransferError> {
///     // ... details omitted ...
///     # Err(TransferError::io("simulated failure"))
/// }
/// ```
#[derive(Debug)]
pub struct TransferError {
    kind: ErrorKind,
    source: Option<BoxError>,
}

impl TransferError {
    /// Creates an error representing a missing or invalid configuration
    /// parameter.
    ///
    /// # Example
    /// ```
    /// use chunked_download::TransferError;
    /// let error = TransferError::configuration("the bucket name is not set");
    /// assert!(error.is_configuration());
    /// ```
    pub fn configuration<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Configuration, source)
    }

    /// A required parameter is missing or invalid.
    ///
    /// These errors are detected before any range is requested from the store.
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ErrorKind::Configuration)
    }

    /// Creates an error representing a content range that cannot be parsed.
    ///
    /// # Example
    /// ```
    /// use chunked_download::{ContentRange, TransferError};
    /// let parse = ContentRange::parse("not-a-range").unwrap_err();
    /// let error = TransferError::malformed_range(parse);
    /// assert!(error.is_malformed_range());
    /// ```
    pub fn malformed_range<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::MalformedRange, source)
    }

    /// The store's content range metadata was missing or could not be parsed.
    pub fn is_malformed_range(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedRange)
    }

    /// Creates an error representing an I/O problem, fetching a range or
    /// writing a chunk.
    pub fn io<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Io, source)
    }

    /// A range fetch or chunk write failed.
    ///
    /// # Troubleshooting
    ///
    /// Fetch failures include network errors and error responses from the
    /// store, use [http_status_code][Self::http_status_code] to distinguish
    /// them. Write failures are usually a full disk or a permission problem
    /// in the output directory.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io)
    }

    /// Creates an error representing a fetch that exceeded its deadline.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use chunked_download::TransferError;
    /// let error = TransferError::timeout("simulated timeout");
    /// assert!(error.is_timeout());
    /// assert!(error.source().is_some());
    /// ```
    pub fn timeout<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Timeout, source)
    }

    /// A range fetch did not complete before the configured fetch timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ErrorKind::Timeout)
    }

    /// Creates an error representing a cancelled transfer.
    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            source: None,
        }
    }

    /// The transfer was cancelled by the application.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Creates an error representing a transfer that stopped making progress.
    pub fn no_progress<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::NoProgress, source)
    }

    /// The store returned ranges that would never complete the transfer.
    ///
    /// # Troubleshooting
    ///
    /// The source is a [ProgressError] describing the inconsistent range. This
    /// usually indicates a bug in the store, or that the object changed while
    /// it was being downloaded.
    pub fn is_no_progress(&self) -> bool {
        matches!(self.kind, ErrorKind::NoProgress)
    }

    /// Creates an error representing an exhausted retry policy.
    pub fn exhausted<T: Into<BoxError>>(source: T) -> Self {
        Self::new(ErrorKind::Exhausted, source)
    }

    /// The fetch failed and the retry policy stopped retrying it.
    ///
    /// The source is the last error returned by the fetch.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.kind, ErrorKind::Exhausted)
    }

    /// The HTTP status code, if the store responded with an error.
    ///
    /// # Example
    /// ```
    /// use chunked_download::TransferError;
    /// use chunked_download::error::HttpError;
    /// let error = TransferError::io(HttpError::Status { code: 503, body: String::new() });
    /// assert_eq!(error.http_status_code(), Some(503));
    /// ```
    pub fn http_status_code(&self) -> Option<u16> {
        let mut source = self.source.as_deref().map(|e| e as &(dyn StdError + 'static));
        while let Some(e) = source {
            if let Some(HttpError::Status { code, .. }) = e.downcast_ref::<HttpError>() {
                return Some(*code);
            }
            source = e.source();
        }
        None
    }

    fn new<T: Into<BoxError>>(kind: ErrorKind, source: T) -> Self {
        Self {
            kind,
            source: Some(source.into()),
        }
    }
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.source) {
            (ErrorKind::Configuration, Some(e)) => write!(f, "invalid configuration: {e}"),
            (ErrorKind::MalformedRange, Some(e)) => {
                write!(f, "cannot parse the content range sent by the store: {e}")
            }
            (ErrorKind::Io, Some(e)) => write!(f, "an I/O error interrupted the transfer: {e}"),
            (ErrorKind::Timeout, Some(e)) => write!(f, "the range fetch exceeded its deadline {e}"),
            (ErrorKind::NoProgress, Some(e)) => {
                write!(f, "the transfer cannot make progress: {e}")
            }
            (ErrorKind::Exhausted, Some(e)) => write!(f, "retry policy exhausted: {e}"),
            (ErrorKind::Cancelled, _) => write!(f, "the transfer was cancelled"),
            (_, None) => unreachable!("no constructor allows this"),
        }
    }
}

impl StdError for TransferError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

#[derive(Debug)]
enum ErrorKind {
    Configuration,
    MalformedRange,
    Io,
    Timeout,
    Cancelled,
    NoProgress,
    Exhausted,
}

/// A parameter of the transfer is missing or invalid.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("the object id is empty")]
    EmptyObjectId,

    #[error("the chunk size must be greater than zero")]
    ZeroChunkSize,

    /// The chunk name template does not contain `{ordinal}`.
    #[error("the chunk name template {0:?} must contain `{{ordinal}}`")]
    MissingOrdinal(String),

    /// Chunk names are file names, not paths.
    #[error("the chunk name template {0:?} must not contain path separators")]
    PathSeparator(String),
}

/// The content range metadata could not be parsed.
///
/// The expected format is `<unit> <start>-<end>/<length>`, for example
/// `bytes 0-1048575/1048576`. The unit token is optional.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum MalformedRangeHeader {
    /// The value has no `/` separating the range from the total length.
    #[error("missing '/' separator in {0:?}")]
    MissingLengthSeparator(String),

    /// The range has no `-` separating the start and end offsets.
    #[error("missing '-' separator in {0:?}")]
    MissingRangeSeparator(String),

    /// One of the segments is not a non-negative decimal integer.
    #[error("the {segment} ({value:?}) in {header:?} is not a valid offset")]
    InvalidNumber {
        segment: &'static str,
        value: String,
        header: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// A problem in the HTTP exchange with the store.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// The store responded with an error status.
    #[error("the store responded with HTTP status {code}: {body}")]
    Status { code: u16, body: String },

    /// Only 200 and 206 status codes are expected in successful responses.
    #[error("unexpected success code {0} in range request, only 200 and 206 are expected")]
    UnexpectedSuccessCode(u16),

    /// Successful HTTP response must include some headers.
    #[error("the response is missing '{0}', a required header")]
    MissingHeader(&'static str),

    /// The received header format is invalid.
    #[error("the format for header '{0}' is incorrect")]
    BadHeaderFormat(&'static str, #[source] BoxError),
}

/// The store returned a range that would prevent the transfer from completing.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum ProgressError {
    /// The returned range ends before the requested start.
    #[error("the store returned a range ending at {end}, before the requested start {requested}")]
    RangeDoesNotAdvance { requested: u64, end: u64 },

    /// The returned range does not start at the requested offset.
    ///
    /// Accepting it would leave a gap, or repeat bytes already persisted.
    #[error("the store returned a range starting at {got}, expected a range starting at {expected}")]
    RangeNotContiguous { expected: u64, got: u64 },

    /// The returned range ends at or past the total object length.
    #[error("the store returned a range ending at {end}, past the object length {total_length}")]
    RangeBeyondObject { end: u64, total_length: u64 },

    /// The total object length changed between two responses.
    #[error("the object length changed from {expected} to {got} during the transfer")]
    LengthChanged { expected: u64, got: u64 },

    /// The transfer reached the configured maximum number of chunks.
    #[error("the transfer did not complete after {0} chunks")]
    ChunkLimit(u64),
}
