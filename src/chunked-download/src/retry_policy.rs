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

//! Defines the retry policies for range fetches.
//!
//! By default a chunked download does not retry: the first error aborts the
//! transfer. Applications can opt in to retrying failed range fetches. Only
//! the fetch is retried, chunk writes are never retried, and there is never
//! more than one outstanding fetch.
//!
//! # Example
//! ```
//! # use chunked_download::retry_policy::*;
//! # use chunked_download::TransferError;
//! let policy = RetryableErrors.with_attempt_limit(3);
//! assert!(matches!(policy.on_error(&RetryState::new(1), io_error()), RetryResult::Continue(_)));
//! assert!(matches!(policy.on_error(&RetryState::new(2), io_error()), RetryResult::Continue(_)));
//! assert!(matches!(policy.on_error(&RetryState::new(3), io_error()), RetryResult::Exhausted(_)));
//!
//! fn io_error() -> TransferError {
//!    // ... details omitted ...
//!    # TransferError::io("something failed in the fetch")
//! }
//! ```

use crate::error::TransferError;

/// The result of a retry policy decision.
#[derive(Debug)]
pub enum RetryResult {
    /// The error is non-retryable, stop the loop.
    Permanent(TransferError),

    /// The error is retryable, but the policy is stopping the loop.
    Exhausted(TransferError),

    /// The error was retryable, continue the loop.
    Continue(TransferError),
}

/// The inputs into a retry policy query.
///
/// We use a struct so we can grow the amount of information without breaking
/// existing retry policies.
#[derive(Debug)]
#[non_exhaustive]
pub struct RetryState {
    /// The number of fetch attempts for the current range, including the one
    /// that just failed.
    pub attempt_count: u32,
}

impl RetryState {
    /// Create a new instance.
    pub fn new(attempt_count: u32) -> Self {
        Self { attempt_count }
    }
}

/// Defines the interface to retry policies.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Determines if the fetch should be attempted again after an error.
    fn on_error(&self, state: &RetryState, error: TransferError) -> RetryResult;
}

/// Extension trait for [RetryPolicy].
pub trait RetryPolicyExt: Sized {
    /// Decorates a [RetryPolicy] to limit the number of attempts.
    ///
    /// The policy passes through the results from the inner policy as long as
    /// `attempt_count < maximum_attempts`. Once the maximum number of attempts
    /// is reached, the policy returns [Exhausted][RetryResult::Exhausted] if
    /// the inner policy returns [Continue][RetryResult::Continue].
    fn with_attempt_limit(self, maximum_attempts: u32) -> LimitedAttemptCount<Self> {
        LimitedAttemptCount::new(self, maximum_attempts)
    }
}
impl<T: RetryPolicy> RetryPolicyExt for T {}

/// Never retry, every error aborts the transfer.
///
/// This is the default policy.
#[derive(Clone, Debug, Default)]
pub struct NeverRetry;

impl RetryPolicy for NeverRetry {
    fn on_error(&self, _state: &RetryState, error: TransferError) -> RetryResult {
        RetryResult::Permanent(error)
    }
}

/// Retries I/O errors, timeouts, and the HTTP status codes that indicate a
/// transient problem in the store.
///
/// The store's error responses for 408, 429, and all 5xx status codes are
/// retried. Malformed content ranges, configuration errors, and cancellations
/// are never retried.
///
/// This policy must be decorated to limit the number of attempts.
///
/// # Example
/// ```
/// # use chunked_download::retry_policy::*;
/// # use chunked_download::TransferError;
/// # use chunked_download::error::HttpError;
/// let policy = RetryableErrors;
/// let error = TransferError::io(HttpError::Status { code: 503, body: String::new() });
/// assert!(matches!(policy.on_error(&RetryState::new(1), error), RetryResult::Continue(_)));
/// let error = TransferError::io(HttpError::Status { code: 404, body: String::new() });
/// assert!(matches!(policy.on_error(&RetryState::new(1), error), RetryResult::Permanent(_)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RetryableErrors;

impl RetryPolicy for RetryableErrors {
    fn on_error(&self, _state: &RetryState, error: TransferError) -> RetryResult {
        if error.is_timeout() {
            return RetryResult::Continue(error);
        }
        if !error.is_io() {
            return RetryResult::Permanent(error);
        }
        match error.http_status_code() {
            None => RetryResult::Continue(error),
            Some(408 | 429 | 500..600) => RetryResult::Continue(error),
            Some(_) => RetryResult::Permanent(error),
        }
    }
}

/// A retry policy decorator that limits the number of attempts.
///
/// See [RetryPolicyExt::with_attempt_limit].
#[derive(Clone, Debug)]
pub struct LimitedAttemptCount<P> {
    inner: P,
    maximum_attempts: u32,
}

impl<P> LimitedAttemptCount<P> {
    pub fn new(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts,
        }
    }
}

impl<P: RetryPolicy> RetryPolicy for LimitedAttemptCount<P> {
    fn on_error(&self, state: &RetryState, error: TransferError) -> RetryResult {
        match self.inner.on_error(state, error) {
            RetryResult::Continue(e) if state.attempt_count >= self.maximum_attempts => {
                RetryResult::Exhausted(e)
            }
            result => result,
        }
    }
}
