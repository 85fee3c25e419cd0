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

use crate::error::MalformedRangeHeader;

/// The range of bytes actually delivered by the store.
///
/// Stores may return fewer bytes than requested, typically near the end of the
/// object. The content range in each response is the only authoritative
/// source for the boundaries of the data and the total object length.
///
/// All offsets are inclusive, as in HTTP `Content-Range` headers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ContentRange {
    /// The offset of the first byte in the response.
    pub start: u64,
    /// The offset of the last byte in the response.
    pub end: u64,
    /// The total length of the object.
    pub total_length: u64,
}

impl ContentRange {
    pub fn new(start: u64, end: u64, total_length: u64) -> Self {
        Self {
            start,
            end,
            total_length,
        }
    }

    /// Parses the content range metadata returned by the store.
    ///
    /// Accepts both `<unit> <start>-<end>/<length>` and the shorter
    /// `<start>-<end>/<length>`. The value is split on `/` first, and then on
    /// `-`. No other validation is performed, in particular `start <= end` is
    /// not enforced here.
    ///
    /// # Example
    /// ```
    /// # use chunked_download::ContentRange;
    /// let range = ContentRange::parse("bytes 0-1048575/1048576")?;
    /// assert_eq!(range, ContentRange::new(0, 1048575, 1048576));
    /// assert!(range.is_complete());
    /// # Ok::<(), chunked_download::error::MalformedRangeHeader>(())
    /// ```
    pub fn parse(value: &str) -> Result<Self, MalformedRangeHeader> {
        // The unit token, if present, is separated by a single space.
        let rest = value
            .split_once(' ')
            .map_or(value, |(_unit, rest)| rest.trim_start());
        let (range, length) = rest
            .split_once('/')
            .ok_or_else(|| MalformedRangeHeader::MissingLengthSeparator(value.to_string()))?;
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| MalformedRangeHeader::MissingRangeSeparator(value.to_string()))?;
        Ok(Self {
            start: parse_offset("start", start, value)?,
            end: parse_offset("end", end, value)?,
            total_length: parse_offset("length", length, value)?,
        })
    }

    /// Returns true if this range includes the last byte of the object.
    ///
    /// This is the only termination condition for a chunked download. A zero
    /// length object can never be complete, as no range can describe it.
    pub fn is_complete(&self) -> bool {
        self.total_length.checked_sub(1) == Some(self.end)
    }

    /// The number of bytes described by this range.
    pub fn len(&self) -> u64 {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start).saturating_add(1)
    }

    /// Returns true if the range describes no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for ContentRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bytes {}-{}/{}", self.start, self.end, self.total_length)
    }
}

impl std::str::FromStr for ContentRange {
    type Err = MalformedRangeHeader;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_offset(
    segment: &'static str,
    value: &str,
    header: &str,
) -> Result<u64, MalformedRangeHeader> {
    value
        .parse::<u64>()
        .map_err(|source| MalformedRangeHeader::InvalidNumber {
            segment,
            value: value.to_string(),
            header: header.to_string(),
            source,
        })
}
