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
use crate::error::{HttpError, ProgressError, TransferError};
use crate::request::RequestedRange;
use crate::stub::{FetchedRange, RangeFetcher};

/// The set of characters that are percent encoded in object keys.
///
/// The `/` character is preserved, object stores use path-style keys.
const PATH_ENCODE_SET: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// The credentials sent with each range request.
///
/// Obtaining the credentials is the application's responsibility, for example
/// using a pre-authorized token.
#[derive(Clone, Default)]
pub enum Credentials {
    /// Send no `Authorization` header.
    #[default]
    Anonymous,
    /// Send an `Authorization: Bearer <token>` header.
    BearerToken(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => f.write_str("Anonymous"),
            Self::BearerToken(_) => f.debug_tuple("BearerToken").field(&"[censored]").finish(),
        }
    }
}

/// Fetches object ranges using HTTP range requests.
///
/// Objects are addressed as `{endpoint}/{bucket}/{key}`, the path-style
/// addressing supported by most object stores.
///
/// # Example
/// ```
/// # use chunked_download::{Credentials, HttpRangeFetcher};
/// let fetcher = HttpRangeFetcher::new("https://storage.example.com", "my-bucket")
///     .with_credentials(Credentials::BearerToken("token".into()));
/// assert_eq!(
///     fetcher.object_url("media/episode 01.mp3"),
///     "https://storage.example.com/my-bucket/media/episode%2001.mp3"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct HttpRangeFetcher {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    credentials: Credentials,
}

impl HttpRangeFetcher {
    pub fn new<E, B>(endpoint: E, bucket: B) -> Self
    where
        E: Into<String>,
        B: Into<String>,
    {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            credentials: Credentials::Anonymous,
        }
    }

    /// Sets the credentials sent with each request.
    pub fn with_credentials(mut self, v: Credentials) -> Self {
        self.credentials = v;
        self
    }

    /// Uses a preconfigured HTTP client, for example with custom timeouts or
    /// proxies.
    pub fn with_client(mut self, v: reqwest::Client) -> Self {
        self.client = v;
        self
    }

    /// The URL used to fetch `object_id`.
    pub fn object_url(&self, object_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            enc(&self.bucket),
            enc(object_id.trim_start_matches('/'))
        )
    }

    fn request_builder(&self, object_id: &str, range: RequestedRange) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .get(self.object_url(object_id))
            .header(http::header::RANGE, range.header_value());
        match &self.credentials {
            Credentials::Anonymous => builder,
            Credentials::BearerToken(token) => builder.bearer_auth(token),
        }
    }
}

impl RangeFetcher for HttpRangeFetcher {
    async fn fetch_range(&self, object_id: &str, range: RequestedRange) -> Result<FetchedRange> {
        let response = self
            .request_builder(object_id, range)
            .send()
            .await
            .map_err(TransferError::io)?;
        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = error_body(code, response.text().await);
            return Err(TransferError::io(HttpError::Status { code, body }));
        }
        let content_range = match status {
            http::StatusCode::PARTIAL_CONTENT => {
                Some(required_header(&response, "content-range")?.to_string())
            }
            // The store ignored the range header and sent the full object.
            http::StatusCode::OK if range.start == 0 => None,
            http::StatusCode::OK => {
                return Err(TransferError::no_progress(
                    ProgressError::RangeNotContiguous {
                        expected: range.start,
                        got: 0,
                    },
                ));
            }
            s => return Err(TransferError::io(HttpError::UnexpectedSuccessCode(s.as_u16()))),
        };
        let payload = response.bytes().await.map_err(TransferError::io)?;
        let content_range = match content_range {
            Some(c) => c,
            None if payload.is_empty() => {
                return Err(TransferError::malformed_range(HttpError::MissingHeader(
                    "content-range",
                )));
            }
            None => format!("bytes 0-{}/{}", payload.len() - 1, payload.len()),
        };
        Ok(FetchedRange {
            payload,
            content_range,
        })
    }
}

fn required_header<'a>(response: &'a reqwest::Response, name: &'static str) -> Result<&'a str> {
    let header = response
        .headers()
        .get(name)
        .ok_or_else(|| TransferError::malformed_range(HttpError::MissingHeader(name)))?;
    header
        .to_str()
        .map_err(|e| TransferError::malformed_range(HttpError::BadHeaderFormat(name, e.into())))
}

/// The body of an error response, a failed read keeps the status error.
fn error_body(code: u16, body: reqwest::Result<String>) -> String {
    match body {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(code, "cannot read the error response body: {e}");
            format!("[cannot read the response body: {e}]")
        }
    }
}

fn enc(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, PATH_ENCODE_SET).to_string()
}
