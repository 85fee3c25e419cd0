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
use crate::error::ProgressError;
use crate::request::RequestedRange;

/// The next action in a chunked download.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Fetch this range and persist it in the next chunk slot.
    Fetch(RequestedRange),
    /// The last byte of the object has been persisted.
    Done { chunks: u64, total_length: u64 },
}

/// The working memory of a single chunked download.
///
/// The state holds the ordinal of the next chunk slot and the last content
/// range returned by the store. It contains no I/O, the controller threads it
/// through each iteration:
///
/// ```
/// # use chunked_download::{ContentRange, RequestedRange, Step, TransferState};
/// let mut state = TransferState::new(10);
/// assert_eq!(state.next_range(), RequestedRange { start: 0, end: 10 });
///
/// // ... fetch the range, the store reports `bytes 0-10/15` ...
/// let info = ContentRange::new(0, 10, 15);
/// state.check(state.next_range(), &info)?;
/// // ... persist the chunk in slot `state.ordinal()` ...
/// assert_eq!(state.advance(info), Step::Fetch(RequestedRange { start: 11, end: 20 }));
///
/// let info = ContentRange::new(11, 14, 15);
/// state.check(state.next_range(), &info)?;
/// assert_eq!(state.advance(info), Step::Done { chunks: 2, total_length: 15 });
/// # Ok::<(), chunked_download::error::ProgressError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferState {
    chunk_size: u64,
    ordinal: u64,
    last: Option<ContentRange>,
}

impl TransferState {
    pub fn new(chunk_size: u64) -> Self {
        Self {
            chunk_size,
            ordinal: 0,
            last: None,
        }
    }

    /// The ordinal of the next chunk slot, also the number of chunks persisted.
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// The content range of the most recently persisted chunk.
    pub fn last(&self) -> Option<&ContentRange> {
        self.last.as_ref()
    }

    /// The range to request next.
    pub fn next_range(&self) -> RequestedRange {
        match &self.last {
            None => RequestedRange::first(self.chunk_size),
            Some(previous) => RequestedRange::following(previous, self.chunk_size),
        }
    }

    /// Verifies a response can make progress towards completing the transfer.
    ///
    /// The store is the authority for the end of the range, it may return
    /// fewer bytes than requested. The range must start at the requested
    /// offset, the chunks are contiguous and never overlap. A response that
    /// ends past the object or changes the object length is also rejected.
    pub fn check(
        &self,
        requested: RequestedRange,
        info: &ContentRange,
    ) -> Result<(), ProgressError> {
        if let Some(previous) = &self.last {
            if previous.total_length != info.total_length {
                return Err(ProgressError::LengthChanged {
                    expected: previous.total_length,
                    got: info.total_length,
                });
            }
        }
        if info.end >= info.total_length {
            return Err(ProgressError::RangeBeyondObject {
                end: info.end,
                total_length: info.total_length,
            });
        }
        if info.end < requested.start {
            return Err(ProgressError::RangeDoesNotAdvance {
                requested: requested.start,
                end: info.end,
            });
        }
        if info.start != requested.start {
            return Err(ProgressError::RangeNotContiguous {
                expected: requested.start,
                got: info.start,
            });
        }
        Ok(())
    }

    /// Records a persisted chunk and returns the next step.
    pub fn advance(&mut self, info: ContentRange) -> Step {
        self.ordinal += 1;
        self.last = Some(info);
        if info.is_complete() {
            return Step::Done {
                chunks: self.ordinal,
                total_length: info.total_length,
            };
        }
        Step::Fetch(self.next_range())
    }
}
