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
use crate::backoff_policy::{BackoffPolicy, ExponentialBackoff};
use crate::content_range::ContentRange;
use crate::error::{ProgressError, TransferError};
use crate::request::{RequestedRange, TransferRequest};
use crate::retry_policy::{NeverRetry, RetryPolicy, RetryResult, RetryState};
use crate::state::{Step, TransferState};
use crate::stub::{ChunkSink, ChunkWriter, FetchedRange, RangeFetcher};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// The outcome of a successful chunked download.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct TransferSummary {
    /// The number of chunk slots written.
    pub chunks: u64,
    /// The object length reported by the store.
    pub total_length: u64,
    /// The number of payload bytes written across all chunks.
    pub bytes_written: u64,
}

/// Downloads an object as a sequence of range requests, writing each range to
/// its own chunk slot.
///
/// The download fetches one range at a time. Each response is written to the
/// next slot, and the slot is finalized before the next range is requested.
/// The content range reported by the store decides where the next range
/// starts, and the download completes when the store reports the last byte of
/// the object.
///
/// # Example
/// ```no_run
/// # use chunked_download::*;
/// # async fn sample() -> Result<()> {
/// let fetcher = HttpRangeFetcher::new("https://storage.example.com", "my-bucket");
/// let sink = FileChunkSink::new("./tmp", ChunkNaming::new("tmp_{ordinal}.mp3")?);
/// let download = ChunkedDownload::new(fetcher, sink);
/// let request = TransferRequest::with_default_chunk_size("media/episode-01.mp3")?;
/// let summary = download.run(&request).await?;
/// println!("downloaded {} bytes in {} chunks", summary.total_length, summary.chunks);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct ChunkedDownload<F, S> {
    fetcher: F,
    sink: S,
    max_chunks: Option<u64>,
    fetch_timeout: Option<Duration>,
    cancel: CancellationToken,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
}

impl<F, S> ChunkedDownload<F, S>
where
    F: RangeFetcher,
    S: ChunkSink,
{
    pub fn new(fetcher: F, sink: S) -> Self {
        Self {
            fetcher,
            sink,
            max_chunks: None,
            fetch_timeout: None,
            cancel: CancellationToken::new(),
            retry_policy: Arc::new(NeverRetry),
            backoff_policy: Arc::new(ExponentialBackoff::default()),
        }
    }

    /// Stops the transfer after `v` chunks if the object is not complete.
    ///
    /// The store's content ranges already bound the number of iterations.
    /// Use this option to limit the number of files created when downloading
    /// objects of unknown size.
    pub fn with_max_chunks(mut self, v: u64) -> Self {
        self.max_chunks = Some(v);
        self
    }

    /// Aborts the transfer if any single range fetch takes longer than `v`.
    pub fn with_fetch_timeout<V: Into<Duration>>(mut self, v: V) -> Self {
        self.fetch_timeout = Some(v.into());
        self
    }

    /// Aborts the transfer when `v` is cancelled.
    ///
    /// Cancellation interrupts pending fetches and backoff delays. A chunk
    /// write in progress completes before the transfer stops.
    pub fn with_cancellation(mut self, v: CancellationToken) -> Self {
        self.cancel = v;
        self
    }

    /// Configures the retry policy for range fetches.
    ///
    /// The default policy never retries.
    pub fn with_retry_policy<V: RetryPolicy + 'static>(mut self, v: V) -> Self {
        self.retry_policy = Arc::new(v);
        self
    }

    /// Configures the delay between fetch attempts.
    pub fn with_backoff_policy<V: BackoffPolicy + 'static>(mut self, v: V) -> Self {
        self.backoff_policy = Arc::new(v);
        self
    }

    /// Downloads the object described by `request`.
    ///
    /// Any error aborts the transfer. Chunks persisted before the error remain
    /// in the sink.
    pub async fn run(&self, request: &TransferRequest) -> Result<TransferSummary> {
        let span = tracing::info_span!(
            "chunked_download",
            object = request.object_id(),
            chunk_size = request.chunk_size()
        );
        self.run_loop(request).instrument(span).await
    }

    async fn run_loop(&self, request: &TransferRequest) -> Result<TransferSummary> {
        let mut state = TransferState::new(request.chunk_size());
        let mut range = state.next_range();
        let mut bytes_written = 0_u64;
        loop {
            if self.cancel.is_cancelled() {
                return Err(TransferError::cancelled());
            }
            let fetched = self.fetch(request.object_id(), range).await?;
            let info = ContentRange::parse(&fetched.content_range)
                .map_err(TransferError::malformed_range)?;
            state
                .check(range, &info)
                .map_err(TransferError::no_progress)?;
            self.persist(state.ordinal(), &fetched.payload).await?;
            bytes_written += fetched.payload.len() as u64;
            tracing::info!(
                ordinal = state.ordinal(),
                requested = %range,
                "download {}-{} bytes (total: {})",
                info.start,
                info.end,
                info.total_length
            );
            match state.advance(info) {
                Step::Done {
                    chunks,
                    total_length,
                } => {
                    return Ok(TransferSummary {
                        chunks,
                        total_length,
                        bytes_written,
                    });
                }
                Step::Fetch(next) => {
                    if let Some(max) = self.max_chunks.filter(|m| state.ordinal() >= *m) {
                        return Err(TransferError::no_progress(ProgressError::ChunkLimit(max)));
                    }
                    range = next;
                }
            }
        }
    }

    async fn fetch(&self, object_id: &str, range: RequestedRange) -> Result<FetchedRange> {
        let mut attempt_count = 0_u32;
        loop {
            attempt_count += 1;
            let error = match self.fetch_attempt(object_id, range).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => e,
            };
            match self
                .retry_policy
                .on_error(&RetryState::new(attempt_count), error)
            {
                RetryResult::Permanent(e) => return Err(e),
                RetryResult::Exhausted(e) => return Err(TransferError::exhausted(e)),
                RetryResult::Continue(e) => {
                    let delay = self.backoff_policy.on_failure(attempt_count);
                    tracing::warn!(%range, attempt_count, ?delay, "retrying range fetch: {e}");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(TransferError::cancelled()),
                        _ = tokio::time::sleep(delay) => {},
                    }
                }
            }
        }
    }

    async fn fetch_attempt(&self, object_id: &str, range: RequestedRange) -> Result<FetchedRange> {
        let fetch = self.fetcher.fetch_range(object_id, range);
        let attempt = async {
            match self.fetch_timeout {
                None => fetch.await,
                Some(timeout) => match tokio::time::timeout(timeout, fetch).await {
                    Ok(result) => result,
                    Err(elapsed) => Err(TransferError::timeout(elapsed)),
                },
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TransferError::cancelled()),
            result = attempt => result,
        }
    }

    async fn persist(&self, ordinal: u64, payload: &[u8]) -> Result<()> {
        tracing::debug!(ordinal, "opening chunk slot");
        let mut writer = self.sink.open_slot(ordinal).await?;
        writer.write(payload).await?;
        writer.finalize().await?;
        tracing::debug!(ordinal, bytes = payload.len(), "chunk slot finalized");
        Ok(())
    }
}
